//! Script sources evaluated in the page. Element functions are called with
//! `this` bound to the element (see `PageSession::call_on_element`).

use crate::core::QueryKind;

pub const READY_STATE: &str = "document.readyState";

pub const IS_INTERACTABLE: &str = r#"function() {
    if (!this.isConnected) return false;
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 &&
           rect.height > 0 &&
           style.visibility !== 'hidden' &&
           style.display !== 'none' &&
           parseFloat(style.opacity) > 0 &&
           !this.disabled;
}"#;

pub const INNER_TEXT: &str = r#"function() {
    return this.innerText || this.textContent || '';
}"#;

/// Centers the element unless it is already fully inside the viewport.
/// Returns whether the document was scrolled.
pub const SCROLL_INTO_VIEW_CENTER: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    const height = window.innerHeight || document.documentElement.clientHeight;
    if (rect.top >= 0 && rect.bottom <= height) {
        return false;
    }
    this.scrollIntoView({ block: 'center', inline: 'nearest' });
    return true;
}"#;

pub const DISPATCH_DOUBLE_CLICK: &str = r#"function() {
    this.dispatchEvent(new MouseEvent('dblclick', { bubbles: true, cancelable: true, view: window }));
    return true;
}"#;

/// Quotes `value` as a JavaScript string literal.
pub fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Counts matches for a query; evaluates to `-1` when the selector is invalid.
pub fn count_matches(kind: QueryKind, selector: &str) -> String {
    let query = match kind {
        QueryKind::Css => format!(
            "document.querySelectorAll({}).length",
            string_literal(selector)
        ),
        QueryKind::Xpath => format!(
            "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
            string_literal(selector)
        ),
    };
    format!(
        r#"
        (function() {{
            try {{
                return {};
            }} catch (e) {{
                return -1;
            }}
        }})()
        "#,
        query
    )
}
