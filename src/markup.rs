//! `<picture>` markup rendering.
//!
//! Uses [maud](https://maud.lambda.xyz/) so every attribute value is escaped.
//! Text nodes carry the line breaks and indentation, so the snippet comes out
//! ready to paste:
//!
//! ```text
//! <picture>
//!     <source media="(min-width: 1920px)" type="image/webp" srcset="/img/f/beach_1920x800.webp">
//!     <source media="(min-width: 320px)" type="image/jpeg" srcset="
//!         /img/f/beach_320x480.jpg 1x,
//!         /img/f/beach_640x960.jpg 2x
//!     ">
//!     <img src="/img/f/beach_320x480.jpg" alt="beach" width="320" height="480" loading="lazy" decoding="async">
//! </picture>
//! ```

use crate::naming::public_url;
use crate::plan::{DensityItem, PictureSource};
use maud::{Markup, html};

const INDENT: &str = "    ";
const SRCSET_INDENT: &str = "        ";

/// Everything the renderer needs besides the sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureContext {
    pub base_path: String,
    pub folder_name: String,
    pub original_filename: String,
    pub original_basename: String,
    pub original_width: u32,
    pub original_height: u32,
}

impl PictureContext {
    fn url(&self, filename: &str) -> String {
        public_url(&self.base_path, &self.folder_name, filename)
    }
}

/// The `<img>` the browser falls back to.
struct Fallback<'a> {
    filename: &'a str,
    width: u32,
    height: u32,
}

/// Smallest source wins; density sets prefer their `1x` item.
fn fallback_for(source: &PictureSource) -> Option<Fallback<'_>> {
    match source {
        PictureSource::Simple {
            width,
            height,
            filename,
            ..
        } => Some(Fallback {
            filename,
            width: *width,
            height: *height,
        }),
        PictureSource::Density { items, .. } => items
            .iter()
            .find(|item| item.density == "1x")
            .or_else(|| items.first())
            .map(|item: &DensityItem| Fallback {
                filename: &item.filename,
                width: item.width,
                height: item.height,
            }),
    }
}

fn srcset(source: &PictureSource, ctx: &PictureContext) -> String {
    match source {
        PictureSource::Simple { filename, .. } => ctx.url(filename),
        PictureSource::Density { items, .. } => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| format!("{} {}", ctx.url(&item.filename), item.density))
                .collect();
            format!(
                "\n{SRCSET_INDENT}{}\n{INDENT}",
                lines.join(&format!(",\n{SRCSET_INDENT}"))
            )
        }
    }
}

fn original_image(ctx: &PictureContext) -> Markup {
    html! {
        img src=(ctx.url(&ctx.original_filename))
            alt=(ctx.original_basename)
            width=(ctx.original_width)
            height=(ctx.original_height);
    }
}

/// Render the `<picture>` element for a plan's sources.
///
/// Sources are stable-sorted by width descending, so equal widths keep their
/// plan order. With no sources the result is a bare `<img>` of the upload.
pub fn render_picture(sources: &[PictureSource], ctx: &PictureContext) -> String {
    if sources.is_empty() {
        return original_image(ctx).into_string();
    }

    let mut sorted: Vec<&PictureSource> = sources.iter().collect();
    sorted.sort_by(|a, b| b.width().cmp(&a.width()));

    let fallback = sorted
        .last()
        .and_then(|s| fallback_for(s))
        .unwrap_or(Fallback {
            filename: &ctx.original_filename,
            width: ctx.original_width,
            height: ctx.original_height,
        });

    let markup = html! {
        picture {
            "\n"
            @for entry in &sorted {
                (INDENT)
                source media=(format!("(min-width: {}px)", entry.width()))
                    type=(format!("image/{}", entry.format().mime_subtype()))
                    srcset=(srcset(entry, ctx));
                "\n"
            }
            (INDENT)
            img src=(ctx.url(fallback.filename))
                alt=(ctx.original_basename)
                width=(fallback.width)
                height=(fallback.height)
                loading="lazy"
                decoding="async";
            "\n"
        }
    };
    markup.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::OutputFormat;

    fn ctx() -> PictureContext {
        PictureContext {
            base_path: "/img/".to_string(),
            folder_name: "responsive-images-abc".to_string(),
            original_filename: "beach.png".to_string(),
            original_basename: "beach".to_string(),
            original_width: 4000,
            original_height: 3000,
        }
    }

    fn simple(width: u32, height: u32, format: OutputFormat) -> PictureSource {
        PictureSource::Simple {
            width,
            height,
            format,
            filename: format!("beach_{width}x{height}.{}", format.extension()),
        }
    }

    fn density(breakpoint: u32, items: &[(&str, u32, u32)]) -> PictureSource {
        PictureSource::Density {
            breakpoint,
            format: OutputFormat::Jpeg,
            items: items
                .iter()
                .map(|(label, w, h)| DensityItem {
                    filename: format!("beach_{w}x{h}.jpg"),
                    density: label.to_string(),
                    width: *w,
                    height: *h,
                })
                .collect(),
        }
    }

    fn media_order(html: &str) -> Vec<&str> {
        html.match_indices("(min-width: ")
            .map(|(i, _)| {
                let rest = &html[i + 12..];
                &rest[..rest.find("px)").unwrap()]
            })
            .collect()
    }

    #[test]
    fn sources_sorted_descending_with_smallest_as_fallback() {
        let sources = vec![
            simple(768, 432, OutputFormat::Jpeg),
            simple(1920, 800, OutputFormat::Webp),
            simple(320, 320, OutputFormat::Png),
        ];
        let html = render_picture(&sources, &ctx());

        assert_eq!(media_order(&html), vec!["1920", "768", "320"]);
        assert!(html.contains(
            r#"<img src="/img/responsive-images-abc/beach_320x320.png" alt="beach" width="320" height="320" loading="lazy" decoding="async">"#
        ));
    }

    #[test]
    fn full_snippet_layout() {
        let sources = vec![
            simple(1920, 800, OutputFormat::Webp),
            density(320, &[("1x", 320, 480), ("2x", 640, 960)]),
        ];
        let html = render_picture(&sources, &ctx());

        let expected = "<picture>\n\
            \x20   <source media=\"(min-width: 1920px)\" type=\"image/webp\" srcset=\"/img/responsive-images-abc/beach_1920x800.webp\">\n\
            \x20   <source media=\"(min-width: 320px)\" type=\"image/jpeg\" srcset=\"\n\
            \x20       /img/responsive-images-abc/beach_320x480.jpg 1x,\n\
            \x20       /img/responsive-images-abc/beach_640x960.jpg 2x\n\
            \x20   \">\n\
            \x20   <img src=\"/img/responsive-images-abc/beach_320x480.jpg\" alt=\"beach\" width=\"320\" height=\"480\" loading=\"lazy\" decoding=\"async\">\n\
            </picture>";
        assert_eq!(html, expected);
    }

    #[test]
    fn density_fallback_prefers_1x() {
        let sources = vec![density(320, &[("2x", 640, 960), ("1x", 320, 480)])];
        let html = render_picture(&sources, &ctx());

        let two_x = html.find("beach_640x960.jpg 2x").unwrap();
        let one_x = html.find("beach_320x480.jpg 1x").unwrap();
        assert!(two_x < one_x, "srcset must keep declared order");
        assert!(html.contains(r#"<img src="/img/responsive-images-abc/beach_320x480.jpg""#));
    }

    #[test]
    fn density_fallback_without_1x_uses_first_item() {
        let sources = vec![density(0, &[("1.5x", 480, 720), ("3x", 960, 1440)])];
        let html = render_picture(&sources, &ctx());
        assert!(html.contains(r#"width="480" height="720""#));
        assert!(html.contains("(min-width: 0px)"));
    }

    #[test]
    fn empty_sources_reference_original_upload() {
        let html = render_picture(&[], &ctx());
        assert_eq!(
            html,
            r#"<img src="/img/responsive-images-abc/beach.png" alt="beach" width="4000" height="3000">"#
        );
    }

    #[test]
    fn ties_keep_plan_order() {
        let sources = vec![
            simple(800, 600, OutputFormat::Avif),
            simple(800, 450, OutputFormat::Jpeg),
        ];
        let html = render_picture(&sources, &ctx());
        let avif = html.find("image/avif").unwrap();
        let jpeg = html.find("image/jpeg").unwrap();
        assert!(avif < jpeg);
        assert!(html.contains(r#"width="800" height="450""#));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut context = ctx();
        context.original_basename = r#"a"b<c"#.to_string();
        let html = render_picture(&[simple(100, 100, OutputFormat::Jpeg)], &context);
        assert!(html.contains(r#"alt="a&quot;b&lt;c""#));
    }

    #[test]
    fn empty_base_path_yields_root_relative_urls() {
        let mut context = ctx();
        context.base_path = String::new();
        let html = render_picture(&[simple(100, 100, OutputFormat::Jpeg)], &context);
        assert!(html.contains(r#"srcset="/responsive-images-abc/beach_100x100.jpg""#));
    }
}
