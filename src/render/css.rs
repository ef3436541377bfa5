//! Inline critical stylesheet.
//!
//! The sheet itself is fixed; only the custom properties in `:root` change per
//! record (colors, blur, background image), followed by the owner's custom CSS.

use crate::domain::entities::{ColorScheme, DesignConfig};
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

pub const MAX_BLUR_PX: u32 = 50;

const STYLESHEET: &str = r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body.smartlink-page {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  background: var(--sl-background);
  color: var(--sl-text);
  line-height: 1.6;
  overflow-x: hidden;
}
.skip-link {
  position: absolute; top: -40px; left: 6px;
  background: var(--sl-primary); color: white;
  padding: 8px; text-decoration: none; border-radius: 4px; z-index: 1000;
}
.skip-link:focus { top: 6px; }
#main-content {
  min-height: 100vh; position: relative;
  display: flex; align-items: center; justify-content: center; padding: 20px;
}
.smartlink-clean {
  position: relative; width: 100%; max-width: 400px;
  display: flex; align-items: center; justify-content: center;
}
.background-artwork {
  position: fixed; top: 0; left: 0; width: 100%; height: 100%;
  background-image: var(--sl-artwork);
  background-size: cover; background-position: center; background-attachment: fixed;
  filter: blur(var(--sl-blur));
  opacity: 0.3; z-index: -1;
}
.main-card {
  background: var(--sl-card);
  backdrop-filter: blur(10px);
  border-radius: 24px; padding: 40px; width: 100%; text-align: center;
  box-shadow: 0 20px 40px rgba(0, 0, 0, 0.1);
}
.album-cover-container {
  position: relative; width: 200px; height: 200px; margin: 0 auto 30px;
  border-radius: 16px; overflow: hidden; box-shadow: 0 10px 30px rgba(0, 0, 0, 0.3);
}
.album-cover { width: 100%; height: 100%; object-fit: cover; }
.play-overlay-btn {
  position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%);
  width: 60px; height: 60px; background: rgba(255, 255, 255, 0.9); border-radius: 50%;
  display: flex; align-items: center; justify-content: center;
  cursor: pointer; transition: all 0.3s ease; opacity: 0;
}
.album-cover-container:hover .play-overlay-btn { opacity: 1; }
.play-triangle {
  width: 0; height: 0; margin-left: 3px;
  border-left: 12px solid var(--sl-primary);
  border-top: 8px solid transparent; border-bottom: 8px solid transparent;
}
.album-title { font-size: 24px; font-weight: 700; margin-bottom: 8px; color: var(--sl-text); }
.artist-name { font-size: 18px; font-weight: 400; color: var(--sl-secondary); margin-bottom: 16px; }
.subtitle {
  font-size: 14px; color: var(--sl-secondary); margin-bottom: 20px;
  text-transform: uppercase; font-weight: 500;
}
.platform-list { display: flex; flex-direction: column; gap: 12px; }
.platform-button {
  display: flex; align-items: center; justify-content: center; gap: 12px;
  padding: 16px 20px; background: var(--sl-primary); color: white;
  text-decoration: none; border-radius: 12px; font-weight: 600;
  transition: all 0.3s ease; border: none; cursor: pointer; font-size: 16px;
}
.platform-button:hover { transform: translateY(-2px); box-shadow: 0 8px 20px rgba(0, 0, 0, 0.2); }
.platform-button:focus-visible { outline: 3px solid var(--sl-accent); outline-offset: 2px; }
.empty-platforms { color: var(--sl-secondary); font-size: 14px; }
@media (max-width: 480px) {
  .main-card { padding: 30px 20px; margin: 10px; }
  .album-cover-container { width: 160px; height: 160px; }
  .album-title { font-size: 20px; }
  .artist-name { font-size: 16px; }
}
"#;

/// Returns `color` when it is a CSS hex color, `fallback` otherwise.
pub fn sanitize_color<'a>(color: &'a str, fallback: &'a str) -> &'a str {
    if HEX_COLOR.is_match(color.trim()) {
        color.trim()
    } else {
        fallback
    }
}

/// `url("...")` for an http(s) image, `none` for anything else.
pub fn css_url(url: Option<&str>) -> String {
    let Some(url) = url.map(str::trim).filter(|u| {
        let lower = u.to_ascii_lowercase();
        lower.starts_with("https://") || lower.starts_with("http://")
    }) else {
        return "none".to_string();
    };

    let mut escaped = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '"' | '\'' | '\\' | '(' | ')' | '<' | '>' | ' ' | '\n' | '\r' | '\t' => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(escaped, "%{:02X}", b);
                }
            }
            _ => escaped.push(c),
        }
    }
    format!("url(\"{}\")", escaped)
}

/// Owner CSS cannot close the `<style>` element: every `<` becomes the CSS
/// escape `\3C `, so no tag can be formed however the input is nested.
fn sanitize_custom_css(css: &str) -> String {
    css.replace('<', "\\3C ")
}

/// The full inline stylesheet for a record.
///
/// `background_image` wins over `artwork` for the blurred background layer.
pub fn critical_css(design: &DesignConfig, artwork: &str) -> String {
    let defaults = ColorScheme::default();
    let colors = &design.color_scheme;

    let primary = sanitize_color(&colors.primary, &defaults.primary);
    let secondary = sanitize_color(&colors.secondary, &defaults.secondary);
    let (background, text, card) = if design.dark_mode {
        ("#121212", "#FFFFFF", "rgba(24, 24, 24, 0.92)")
    } else {
        (
            sanitize_color(&colors.background, &defaults.background),
            sanitize_color(&colors.text, &defaults.text),
            "rgba(255, 255, 255, 0.95)",
        )
    };
    let accent = colors
        .accent
        .as_deref()
        .map(|a| sanitize_color(a, primary))
        .unwrap_or(primary);

    let background_image = design
        .background_image
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .or(Some(artwork));

    let mut css = format!(
        ":root {{ --sl-primary: {}; --sl-secondary: {}; --sl-background: {}; --sl-text: {}; --sl-accent: {}; --sl-card: {}; --sl-blur: {}px; --sl-artwork: {}; }}",
        primary,
        secondary,
        background,
        text,
        accent,
        card,
        design.background_blur.min(MAX_BLUR_PX),
        css_url(background_image),
    );
    css.push_str(STYLESHEET);

    if let Some(custom) = design.custom_css.as_deref().filter(|c| !c.trim().is_empty()) {
        css.push_str(&sanitize_custom_css(custom));
        css.push('\n');
    }

    css
}
