//! Single-color rewriting of icon markup.
//!
//! Catalog icons arrive with whatever fills their authors chose: attribute
//! fills, inline `style` fills, gradients, or no fill at all. Before an icon
//! is decoded it is rewritten so every filled shape carries exactly one
//! color. The rewrite streams the markup through `quick-xml`, so comments,
//! declarations and unrelated attributes pass through untouched.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::color::normalize_hex;
use crate::error::{Error, Result};

/// Elements whose fill is forced to the target color.
const SHAPE_ELEMENTS: &[&[u8]] = &[
    b"path",
    b"circle",
    b"ellipse",
    b"rect",
    b"polygon",
    b"polyline",
];

/// Rewrites `markup` so that every filled shape renders in `color`.
///
/// Existing `fill` attributes and `fill:` style declarations are dropped and
/// replaced by a single `fill` attribute. Shapes explicitly marked unfilled
/// (`none` / `transparent`) stay unfilled. The root `<svg>` also receives the
/// fill so inherited fills agree.
///
/// Returns [`Error::MalformedMarkup`] when the markup cannot be parsed or has
/// no `<svg>` root; callers are expected to fall back to the original markup.
///
/// ```
/// use iconcraft_renderer::recolor_svg;
///
/// let svg = r##"<svg xmlns="http://www.w3.org/2000/svg"><path fill="#000" d="M0 0h1v1z"/></svg>"##;
/// let red = recolor_svg(svg, "#ff0000").unwrap();
/// assert!(red.contains(r##"fill="#ff0000""##));
/// assert!(!red.contains(r##"fill="#000""##));
/// ```
pub fn recolor_svg(markup: &str, color: &str) -> Result<String> {
    let color = normalize_hex(color)?;
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len() + 64));
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|_| Error::MalformedMarkup)?;
        let event = match event {
            Event::Eof => break,
            Event::Start(element) => Event::Start(rewrite(&element, &color, &mut seen_root)?),
            Event::Empty(element) => Event::Empty(rewrite(&element, &color, &mut seen_root)?),
            other => other,
        };
        writer
            .write_event(event)
            .map_err(|_| Error::MalformedMarkup)?;
    }

    if !seen_root {
        return Err(Error::MalformedMarkup);
    }
    String::from_utf8(writer.into_inner()).map_err(|_| Error::MalformedMarkup)
}

/// Dispatches one element: the first element must be the `<svg>` root.
fn rewrite(element: &BytesStart<'_>, color: &str, seen_root: &mut bool) -> Result<BytesStart<'static>> {
    let local = element.local_name();
    if !*seen_root {
        if local.as_ref() != b"svg" {
            return Err(Error::MalformedMarkup);
        }
        *seen_root = true;
        return with_fill(element, color, false);
    }

    if SHAPE_ELEMENTS.contains(&local.as_ref()) {
        with_fill(element, color, true)
    } else {
        Ok(element.to_owned())
    }
}

/// Copies `element`, replacing every fill declaration with a single
/// `fill` attribute.
fn with_fill(element: &BytesStart<'_>, color: &str, keep_unfilled: bool) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    let mut unfilled = false;

    for attr in element.attributes() {
        let attr = attr.map_err(|_| Error::MalformedMarkup)?;
        match attr.key.as_ref() {
            b"fill" => {
                let value = attr.unescape_value().map_err(|_| Error::MalformedMarkup)?;
                unfilled |= is_unfilled(&value);
            }
            b"style" => {
                let value = attr.unescape_value().map_err(|_| Error::MalformedMarkup)?;
                let (rest, style_unfilled) = strip_fill_declarations(&value);
                unfilled |= style_unfilled;
                if !rest.is_empty() {
                    out.push_attribute(("style", rest.as_str()));
                }
            }
            _ => out.push_attribute(attr),
        }
    }

    let fill = if keep_unfilled && unfilled { "none" } else { color };
    out.push_attribute(("fill", fill));
    Ok(out)
}

fn is_unfilled(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("transparent")
}

/// Removes `fill:` declarations from an inline style.
///
/// Returns the remaining declarations and whether a removed one was unfilled.
fn strip_fill_declarations(style: &str) -> (String, bool) {
    let mut unfilled = false;
    let kept: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| match decl.split_once(':') {
            Some((property, value)) if property.trim().eq_ignore_ascii_case("fill") => {
                unfilled |= is_unfilled(value);
                false
            }
            _ => true,
        })
        .collect();
    (kept.join(";"), unfilled)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r##"<?xml version="1.0"?>
<!-- brand mark -->
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <path fill="none" d="M0 0h24v24H0z"/>
  <path d="M12 2L2 22h20z"/>
  <circle cx="12" cy="12" r="3" style="fill:#00ff00;opacity:0.5"/>
  <g fill="#123456"><rect x="1" y="1" width="2" height="2" fill="url(#grad)"></rect></g>
</svg>"##;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn every_shape_receives_the_color() {
        let out = recolor_svg(ICON, "#ff0000").unwrap();
        // root + triangle + circle + rect
        assert_eq!(count(&out, r##"fill="#ff0000""##), 4);
        assert!(!out.contains("url(#grad)"));
        assert!(!out.contains("#00ff00"));
    }

    #[test]
    fn unfilled_shapes_stay_unfilled() {
        let out = recolor_svg(ICON, "#ff0000").unwrap();
        assert!(out.contains(r#"<path d="M0 0h24v24H0z" fill="none"/>"#));
    }

    #[test]
    fn style_keeps_unrelated_declarations() {
        let out = recolor_svg(ICON, "#ff0000").unwrap();
        assert!(out.contains(r#"style="opacity:0.5""#));
    }

    #[test]
    fn comments_and_declaration_pass_through() {
        let out = recolor_svg(ICON, "#ff0000").unwrap();
        assert!(out.starts_with(r#"<?xml version="1.0"?>"#));
        assert!(out.contains("<!-- brand mark -->"));
    }

    #[test]
    fn recolor_is_idempotent() {
        let once = recolor_svg(ICON, "#3498db").unwrap();
        let twice = recolor_svg(&once, "#3498db").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn new_color_supersedes_old() {
        let red = recolor_svg(ICON, "#ff0000").unwrap();
        let blue = recolor_svg(&red, "0000ff").unwrap();
        assert!(!blue.contains("#ff0000"));
        assert_eq!(count(&blue, r##"fill="#0000ff""##), 4);
    }

    #[test]
    fn missing_root_is_malformed() {
        assert!(matches!(
            recolor_svg("<g><path d=\"M0 0\"/></g>", "#ffffff"),
            Err(Error::MalformedMarkup)
        ));
        assert!(matches!(
            recolor_svg("plain text, no markup", "#ffffff"),
            Err(Error::MalformedMarkup)
        ));
    }

    #[test]
    fn unbalanced_markup_is_malformed() {
        assert!(matches!(
            recolor_svg("<svg><path></svg>", "#ffffff"),
            Err(Error::MalformedMarkup)
        ));
    }

    #[test]
    fn invalid_color_is_rejected() {
        assert!(matches!(
            recolor_svg(ICON, "red"),
            Err(Error::InvalidColor(_))
        ));
    }

    #[test]
    fn strip_fill_declarations_reports_none() {
        let (rest, unfilled) = strip_fill_declarations("stroke:#000; fill : none ;");
        assert_eq!(rest, "stroke:#000");
        assert!(unfilled);
    }
}
