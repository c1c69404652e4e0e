//! Persian text normalization and word tokenization.
//!
//! Listing pages mix Arabic and Persian codepoints for the same letters and
//! write numbers with Persian or Arabic-Indic numerals. Label lookup and
//! price parsing both operate on the canonical form produced here.

/// Canonicalize Arabic-script variants, fold digits to ASCII and collapse
/// whitespace runs to single spaces.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'ي' => out.push('ی'),
            'ك' => out.push('ک'),
            'ة' => out.push('ه'),
            // tatweel and Arabic diacritics carry no meaning in labels
            '\u{0640}' | '\u{064B}'..='\u{0652}' => {}
            '۰'..='۹' => out.push(fold_digit(c, '۰')),
            '٠'..='٩' => out.push(fold_digit(c, '٠')),
            _ => out.push(c),
        }
    }
    collapse_whitespace(&out)
}

fn fold_digit(c: char, zero: char) -> char {
    char::from(b'0' + (c as u32 - zero as u32) as u8)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalized text into words. Zero-width non-joiners are not word
/// boundaries, so compound labels stay a single word.
pub fn tokenize_words(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_arabic_letter_variants() {
        assert_eq!(normalize("كتاب"), "کتاب");
        assert_eq!(normalize("علي"), "علی");
    }

    #[test]
    fn folds_persian_and_arabic_digits_to_ascii() {
        assert_eq!(normalize("۵۰۰"), "500");
        assert_eq!(normalize("٥٠٠"), "500");
        assert_eq!(normalize("طبقه ۳ از ۵"), "طبقه 3 از 5");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  ودیعه \t و \n اجاره "), "ودیعه و اجاره");
    }

    #[test]
    fn zwnj_is_not_a_word_boundary() {
        let words = tokenize_words(&normalize("آگهی‌دهنده"));
        assert_eq!(words.len(), 1);
        assert_eq!(words[0], "آگهی‌دهنده");
    }

    #[test]
    fn tokenizes_price_text() {
        let words = tokenize_words("۵۰۰٬۰۰۰٬۰۰۰ تومان");
        assert_eq!(words, vec!["۵۰۰٬۰۰۰٬۰۰۰", "تومان"]);
    }
}
