//! XPath locators for elements addressed by visible text
//!
//! The app's menus and forms are addressed the way a user sees them: a button
//! by its name, a menu entry by its text, an input by its label.

/// Quote `value` as an XPath 1.0 string literal
///
/// XPath has no escape sequences, so a value containing both quote kinds is
/// split and rebuilt with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }

    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// A button whose visible text or `aria-label` is `name`
pub fn button(name: &str) -> String {
    let lit = xpath_literal(name);
    format!(
        "//button[normalize-space(.)={lit} or @aria-label={lit}] | //*[@role='button'][normalize-space(.)={lit} or @aria-label={lit}]",
        lit = lit
    )
}

/// The element owning a text node equal to `text` (whitespace-normalized)
pub fn text(text: &str) -> String {
    format!("//*[text()[normalize-space(.)={}]]", xpath_literal(text))
}

/// The form control labelled `label`, via `for=`, nesting, or `aria-label`
pub fn labelled_input(label: &str) -> String {
    let lit = xpath_literal(label);
    format!(
        "//*[self::input or self::textarea][@id=//label[normalize-space(.)={lit}]/@for] | //label[normalize-space(.)={lit}]//*[self::input or self::textarea] | //*[self::input or self::textarea][@aria-label={lit}]",
        lit = lit
    )
}
