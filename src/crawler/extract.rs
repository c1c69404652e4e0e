use chrono::DateTime;

use crate::crawler::models::{FieldKey, FieldMap, FieldValue, Listing, ListingKind};
use crate::crawler::parser::PostPage;
use crate::text;

const CURRENCY_UNIT: &str = "تومان";
const MILLION: &str = "میلیون";
const NEGATION: &str = "ندارد";

/// How a row label is matched against a rule. Exact rules are listed before
/// substring rules in every table, so an exact match always wins.
enum LabelMatch {
    Exact(&'static str),
    Contains(&'static str),
}

struct LabelRule {
    matcher: LabelMatch,
    key: FieldKey,
    /// Price-valued keys get their value run through `tokenize_price`;
    /// everything else is stored as normalized text.
    price: bool,
}

impl LabelRule {
    fn matches(&self, label: &str) -> bool {
        match self.matcher {
            LabelMatch::Exact(s) => label == s,
            LabelMatch::Contains(s) => label.contains(s),
        }
    }
}

macro_rules! rule {
    (exact $label:literal => $key:ident) => {
        LabelRule { matcher: LabelMatch::Exact($label), key: FieldKey::$key, price: false }
    };
    (exact $label:literal => $key:ident, price) => {
        LabelRule { matcher: LabelMatch::Exact($label), key: FieldKey::$key, price: true }
    };
    (contains $label:literal => $key:ident, price) => {
        LabelRule { matcher: LabelMatch::Contains($label), key: FieldKey::$key, price: true }
    };
}

const RENT_RULES: &[LabelRule] = &[
    rule!(exact "ودیعه" => Rahn, price),
    rule!(exact "اجارهٔ ماهانه" => Rent, price),
    rule!(exact "ودیعه و اجاره" => Convertable),
    rule!(exact "مناسب برای" => SuitableFor),
    rule!(exact "آگهی‌دهنده" => AdvBy),
    rule!(exact "طبقه" => Floor),
    rule!(exact "متراژ" => Space),
    rule!(exact "ساخت" => Year),
    rule!(exact "اتاق" => Rooms),
    rule!(contains "ودیعه" => Rahn, price),
    rule!(contains "اجار" => Rent, price),
];

const SELL_RULES: &[LabelRule] = &[
    rule!(exact "قیمت کل" => TotalPrice, price),
    rule!(exact "قیمت هر متر" => MeterPrice, price),
    rule!(exact "آگهی‌دهنده" => AdvBy),
    rule!(exact "طبقه" => Floor),
    rule!(exact "متراژ" => Space),
    rule!(exact "ساخت" => Year),
    rule!(exact "اتاق" => Rooms),
    rule!(contains "ودیعه" => Rahn, price),
    rule!(contains "اجار" => Rent, price),
];

/// Standalone tags whose exact phrase encodes an amenity. The same phrase
/// suffixed with the negation word encodes its explicit absence.
const FEATURE_FLAGS: &[(&str, FieldKey)] = &[
    ("انباری", FieldKey::Cabinet),
    ("پارکینگ", FieldKey::Parking),
    ("آسانسور", FieldKey::Elevator),
];

/// Turns the field-bearing fragments of a post page into a mapping from
/// canonical key to typed value. Pure and tolerant: unmapped labels, empty
/// values and unparsable prices produce no entry, never an error.
pub struct ListingExtractor {
    kind: ListingKind,
}

impl ListingExtractor {
    pub fn new(kind: ListingKind) -> Self {
        Self { kind }
    }

    /// Labeled rows first, then feature tags, then the wide rows. Later
    /// groups overwrite earlier ones when both populate the same key.
    pub fn extract(&self, page: &PostPage) -> FieldMap {
        let mut fields = FieldMap::new();
        for (label, value) in &page.info_rows {
            self.apply_labeled_row(&mut fields, label, value);
        }
        for tag in &page.feature_tags {
            apply_feature_tag(&mut fields, tag);
        }
        for (label, value) in &page.wide_rows {
            self.apply_labeled_row(&mut fields, label, value);
        }
        fields
    }

    fn apply_labeled_row(&self, fields: &mut FieldMap, label: &str, value: &str) {
        let label = text::normalize(label);
        let value = text::normalize(value);
        if label.is_empty() || value.is_empty() {
            return;
        }
        let rules = match self.kind {
            ListingKind::Rent => RENT_RULES,
            ListingKind::Sell => SELL_RULES,
        };
        let Some(rule) = rules.iter().find(|r| r.matches(&label)) else {
            return;
        };
        let stored = if rule.price {
            match tokenize_price(&value) {
                Some(price) => FieldValue::Price(price),
                None => return,
            }
        } else {
            FieldValue::Text(value)
        };
        fields.insert(rule.key, stored);
    }
}

fn apply_feature_tag(fields: &mut FieldMap, tag: &str) {
    let tag = text::normalize(tag);
    for (phrase, key) in FEATURE_FLAGS {
        if tag == *phrase {
            fields.insert(*key, FieldValue::Flag(true));
            return;
        }
        if tag == format!("{phrase} {NEGATION}") {
            fields.insert(*key, FieldValue::Flag(false));
            return;
        }
    }
    // unmatched phrases set nothing
}

/// Price text to millions of toman.
///
/// Recognized shapes: `<number> تومان` (plain toman amount, divided by one
/// million) and `<number> میلیون تومان` (already millions). A single word is
/// a negotiable price, stored as 0. Anything else is unparsable and yields
/// no value.
pub fn tokenize_price(value: &str) -> Option<f64> {
    let words = text::tokenize_words(value);
    match words.as_slice() {
        [_single] => Some(0.0),
        [number, unit] if unit == CURRENCY_UNIT => {
            parse_digits(number).map(|n| n as f64 / 1_000_000.0)
        }
        [number, million, unit] if million == MILLION && unit == CURRENCY_UNIT => {
            parse_digits(number).map(|n| n as f64)
        }
        _ => None,
    }
}

fn parse_digits(word: &str) -> Option<i64> {
    let digits: String = text::normalize(word)
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Builds the final record in one pass: extractor output plus the page-level
/// fragments, with amenity booleans defaulting to false when absent.
pub fn build_listing(
    kind: ListingKind,
    token: &str,
    url: &str,
    page: &PostPage,
    last_post_sort_date: i64,
) -> Listing {
    let fields = ListingExtractor::new(kind).extract(page);

    let texts = |key: FieldKey| match fields.get(&key) {
        Some(FieldValue::Text(s)) => Some(s.clone()),
        _ => None,
    };
    let price = |key: FieldKey| match fields.get(&key) {
        Some(FieldValue::Price(p)) => Some(*p),
        _ => None,
    };
    let flag = |key: FieldKey| matches!(fields.get(&key), Some(FieldValue::Flag(true)));

    Listing {
        token: token.to_string(),
        url: url.to_string(),
        title: text::normalize(&page.title),
        sub_title: page.sub_title.as_deref().map(text::normalize),
        description: text::normalize(&page.description),
        last_post_sort_date,
        post_date: DateTime::from_timestamp_micros(last_post_sort_date)
            .unwrap_or(DateTime::UNIX_EPOCH),
        rahn: price(FieldKey::Rahn),
        rent: price(FieldKey::Rent),
        total_price: price(FieldKey::TotalPrice),
        meter_price: price(FieldKey::MeterPrice),
        convertable: texts(FieldKey::Convertable),
        suitable_for: texts(FieldKey::SuitableFor),
        adv_by: texts(FieldKey::AdvBy),
        floor: texts(FieldKey::Floor),
        space: texts(FieldKey::Space),
        year: texts(FieldKey::Year),
        rooms: texts(FieldKey::Rooms),
        parking: flag(FieldKey::Parking),
        elevator: flag(FieldKey::Elevator),
        cabinet: flag(FieldKey::Cabinet),
    }
}
