use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Text of every descendant string, each trimmed, empty ones dropped, joined
/// with single spaces.
pub fn normalized_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn document_text(document: &Html) -> String {
    normalized_text(document.root_element())
}

pub fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

pub fn select_first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = parse_selector(css)?;
    element.select(&selector).next()
}

fn is_one_of(element: &ElementRef, tags: &[&str]) -> bool {
    tags.contains(&element.value().name())
}

/// Nearest ancestor whose tag is in `tags`.
pub fn closest<'a>(element: ElementRef<'a>, tags: &[&str]) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| is_one_of(el, tags))
}

pub fn has_ancestor(element: ElementRef, tags: &[&str]) -> bool {
    closest(element, tags).is_some()
}

/// First descendant (document order) whose tag is in `tags`.
pub fn find_descendant<'a>(element: ElementRef<'a>, tags: &[&str]) -> Option<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| is_one_of(el, tags))
}

/// First `<a>` with an `href` attribute.
pub fn first_link<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a" && el.value().attr("href").is_some())
}

pub fn parent_element<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}
