//! HTML and catalog builders shared by the integration suites.

#![allow(dead_code)]

use catalog_dl_core::{Item, ItemExtra};

/// Wraps a JSON payload the way the listing and chapter pages embed it.
pub fn window_data_page(json: &str) -> String {
    format!(
        "<html><head><script>var other = 1;</script>\
         <script>window.__data = {json};</script></head><body></body></html>"
    )
}

/// Item page embedding a player frame.
pub fn episode_page(frame_src: &str) -> String {
    format!(r#"<html><body><div class="player"><iframe src="{frame_src}"></iframe></div></body></html>"#)
}

/// Player document with one `video > source` element.
pub fn player_page(media_src: &str, media_type: &str) -> String {
    format!(
        r#"<html><body><video controls><source src="{media_src}" type="{media_type}"></video></body></html>"#
    )
}

/// Chapter page listing `(url, type)` page images.
pub fn chapter_page(pages: &[(&str, &str)]) -> String {
    let entries: Vec<String> = pages
        .iter()
        .map(|(url, kind)| format!(r#"{{"url":"{url}","type":"{kind}"}}"#))
        .collect();
    window_data_page(&format!(
        r#"{{"chapter":{{"pages":[{}]}}}}"#,
        entries.join(",")
    ))
}

pub fn episode(number: u32, arc_id: i64, href: &str) -> Item {
    Item {
        number,
        name: format!("Episode {number}"),
        arc_id: Some(arc_id),
        href: href.to_string(),
        extra: ItemExtra::Episode {
            lang_sub: "de".to_string(),
            lang_dub: String::new(),
            is_available: true,
        },
    }
}

pub fn chapter(number: u32, arc_id: i64, href: &str, pages: u32) -> Item {
    Item {
        number,
        name: format!("Chapter {number}"),
        arc_id: Some(arc_id),
        href: href.to_string(),
        extra: ItemExtra::Chapter { pages },
    }
}
