// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-engine fix for insufficient color contrast.
//!
//! Text becomes black or white, whichever suits the effective background by
//! perceived brightness. When that still misses the required ratio the
//! element also gets the opposite background.

use crate::checks::contrast::{background_color, text_color};
use crate::color::{self, Rgb};
use crate::document::{Document, NodeId};
use crate::error::Result;
use crate::issue::RemediationDetails;

/// Rewrite the element's inline colors and describe the change
pub fn fix_contrast(doc: &mut Document, node: NodeId, description: &str) -> Result<RemediationDetails> {
    let style = |doc: &Document| doc.attr(node, "style").unwrap_or("").to_string();
    let before = style(doc);
    let large = color::is_large_text(doc.tag(node), &before);
    let required = color::required_ratio(large);

    let old_text = text_color(doc, node).unwrap_or(color::BLACK);
    let background = background_color(doc, node).unwrap_or(color::WHITE);

    let new_text: Rgb = if color::is_dark(background) {
        color::WHITE
    } else {
        color::BLACK
    };
    doc.set_style_property(node, "color", &color::to_hex(new_text))?;

    let mut fix = format!(
        "Changed text color from {} to {} on background {}",
        color::to_hex(old_text),
        color::to_hex(new_text),
        color::to_hex(background)
    );
    let mut final_background = background;

    if color::contrast_ratio(new_text, background) < required {
        final_background = if new_text == color::WHITE {
            color::BLACK
        } else {
            color::WHITE
        };
        doc.set_style_property(node, "background-color", &color::to_hex(final_background))?;
        fix.push_str(&format!(
            "; changed background color to {}",
            color::to_hex(final_background)
        ));
    }

    fix.push_str(&format!(
        " (contrast {:.2}:1, required {:.1}:1)",
        color::contrast_ratio(new_text, final_background),
        required
    ));

    Ok(RemediationDetails {
        description: Some(description.to_string()),
        fix_description: Some(fix),
        before_content: Some(before),
        after_content: Some(style(doc)),
        failure_reason: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(html: &str) -> (Document, NodeId, RemediationDetails) {
        let mut doc = Document::parse(html).unwrap();
        let node = doc.find_first("p").unwrap();
        let details = fix_contrast(&mut doc, node, "low contrast").unwrap();
        (doc, node, details)
    }

    #[test]
    fn test_light_background_gets_black_text() {
        let (doc, node, details) =
            fixed(r#"<html><body><p style="color: #999999">Faint</p></body></html>"#);
        assert_eq!(doc.attr(node, "style"), Some("color: #000000"));
        assert_eq!(details.before_content.as_deref(), Some("color: #999999"));
        assert_eq!(details.after_content.as_deref(), Some("color: #000000"));
        assert!(details.fix_description.unwrap().contains("from #999999 to #000000"));
    }

    #[test]
    fn test_dark_inherited_background_gets_white_text() {
        let (doc, node, _) = fixed(
            r#"<html><body><div style="background-color: #101010"><p style="color: #333">Dim</p></div></body></html>"#,
        );
        assert_eq!(doc.attr(node, "style"), Some("color: #FFFFFF"));
        let fg = text_color(&doc, node).unwrap();
        let bg = background_color(&doc, node).unwrap();
        assert!(color::contrast_ratio(fg, bg) >= 4.5);
    }

    #[test]
    fn test_mid_tone_background_is_replaced_when_text_alone_fails() {
        // Brightness says "dark" but white text only reaches about 4.4:1
        let (doc, node, details) = fixed(
            r#"<html><body><p style="color: #777777; background-color: #6464FF">Periwinkle</p></body></html>"#,
        );
        let fg = text_color(&doc, node).unwrap();
        let bg = background_color(&doc, node).unwrap();
        assert!(color::contrast_ratio(fg, bg) >= 4.5, "{:?}", doc.attr(node, "style"));
        assert!(details.fix_description.unwrap().contains("changed background color"));
    }

    #[test]
    fn test_non_element_is_an_error() {
        let mut doc = Document::parse("<html><body>x</body></html>").unwrap();
        let root = doc.root();
        assert!(fix_contrast(&mut doc, root, "x").is_err());
    }
}
