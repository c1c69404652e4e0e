use scraper::{ElementRef, Html, Selector};

// Structural paths of the field-bearing regions on a post page. These are
// configuration, not logic; the extractor only sees the collected fragments.
const INFO_ROW: &str = ".kt-group-row-item--info-row";
const FEATURE_TAG: &str = ".kt-group-row-item__value.kt-body.kt-body--stable";
const WIDE_ROW: &str = ".kt-base-row.kt-base-row--large.kt-unexpandable-row";
const TITLE: &str = ".kt-page-title__title";
const SUB_TITLE: &str = ".kt-page-title__subtitle";
const DESCRIPTION: &str = ".kt-description-row__text";

/// Field-bearing fragments of one post page. Text is raw apart from
/// trimming; normalization happens in the extractor.
#[derive(Debug, Default)]
pub struct PostPage {
    pub title: String,
    pub sub_title: Option<String>,
    pub description: String,
    /// Labeled rows: (label, value) pairs.
    pub info_rows: Vec<(String, String)>,
    /// Standalone tags whose presence encodes an amenity.
    pub feature_tags: Vec<String>,
    /// Large unexpandable rows, same (label, value) shape as `info_rows`
    /// but a distinct markup location.
    pub wide_rows: Vec<(String, String)>,
}

pub fn parse_post_page(html: &str) -> PostPage {
    let doc = Html::parse_document(html);

    let info_row = sel(INFO_ROW);
    let feature_tag = sel(FEATURE_TAG);
    let wide_row = sel(WIDE_ROW);
    let span = sel("span");
    let p = sel("p");

    let mut page = PostPage {
        title: first_text(&doc, &sel(TITLE)).unwrap_or_default(),
        sub_title: first_text(&doc, &sel(SUB_TITLE)),
        description: first_text(&doc, &sel(DESCRIPTION)).unwrap_or_default(),
        ..PostPage::default()
    };

    for row in doc.select(&info_row) {
        if let Some(pair) = row_pair(row, &span) {
            page.info_rows.push(pair);
        }
    }

    for tag in doc.select(&feature_tag) {
        let text = text_of(tag);
        if !text.is_empty() {
            page.feature_tags.push(text);
        }
    }

    for row in doc.select(&wide_row) {
        if let Some(pair) = row_pair(row, &p) {
            page.wide_rows.push(pair);
        }
    }

    page
}

/// First two cells of a row become (label, value). Rows missing either
/// fragment are dropped, never an error.
fn row_pair(row: ElementRef, cell: &Selector) -> Option<(String, String)> {
    let mut cells = row.select(cell);
    let label = text_of(cells.next()?);
    let value = text_of(cells.next()?);
    if label.is_empty() || value.is_empty() {
        return None;
    }
    Some((label, value))
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    let text = text_of(doc.select(selector).next()?);
    (!text.is_empty()).then_some(text)
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn sel(selector: &str) -> Selector {
    Selector::parse(selector).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_HTML: &str = r#"
        <html><body>
          <h1 class="kt-page-title__title">اجارهٔ آپارتمان ۷۵ متری</h1>
          <div class="kt-page-title__subtitle">تهران، نارمک</div>
          <div class="kt-base-row kt-group-row-item--info-row">
            <span class="kt-group-row-item__title">ودیعه</span>
            <span class="kt-group-row-item__value">۲۰۰ میلیون تومان</span>
          </div>
          <div class="kt-base-row kt-group-row-item--info-row">
            <span class="kt-group-row-item__title">متراژ</span>
            <span class="kt-group-row-item__value">۷۵</span>
          </div>
          <div class="kt-group-row-item">
            <span class="kt-group-row-item__value kt-body kt-body--stable">پارکینگ</span>
          </div>
          <div class="kt-group-row-item">
            <span class="kt-group-row-item__value kt-body kt-body--stable">آسانسور ندارد</span>
          </div>
          <div class="kt-base-row kt-base-row--large kt-unexpandable-row">
            <div class="kt-base-row__start"><p>آگهی‌دهنده</p></div>
            <div class="kt-base-row__end"><p>شخصی</p></div>
          </div>
          <div class="kt-description-row__text">آفتاب‌گیر و بازسازی‌شده</div>
        </body></html>
    "#;

    #[test]
    fn collects_all_three_fragment_groups() {
        let page = parse_post_page(POST_HTML);

        assert_eq!(
            page.info_rows,
            vec![
                ("ودیعه".to_string(), "۲۰۰ میلیون تومان".to_string()),
                ("متراژ".to_string(), "۷۵".to_string()),
            ]
        );
        assert_eq!(page.feature_tags, vec!["پارکینگ", "آسانسور ندارد"]);
        assert_eq!(
            page.wide_rows,
            vec![("آگهی‌دهنده".to_string(), "شخصی".to_string())]
        );
    }

    #[test]
    fn collects_title_subtitle_description() {
        let page = parse_post_page(POST_HTML);
        assert_eq!(page.title, "اجارهٔ آپارتمان ۷۵ متری");
        assert_eq!(page.sub_title.as_deref(), Some("تهران، نارمک"));
        assert_eq!(page.description, "آفتاب‌گیر و بازسازی‌شده");
    }

    #[test]
    fn missing_fragments_yield_empty_groups() {
        let page = parse_post_page("<html><body><p>nothing here</p></body></html>");
        assert!(page.title.is_empty());
        assert!(page.sub_title.is_none());
        assert!(page.info_rows.is_empty());
        assert!(page.feature_tags.is_empty());
        assert!(page.wide_rows.is_empty());
    }

    #[test]
    fn rows_missing_a_cell_are_dropped() {
        let html = r#"<div class="kt-base-row kt-group-row-item--info-row">
            <span class="kt-group-row-item__title">ودیعه</span>
        </div>"#;
        let page = parse_post_page(html);
        assert!(page.info_rows.is_empty());
    }
}
