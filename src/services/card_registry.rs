//! Card Registry for LinkHub.
//!
//! Reads the static bookmark cards out of page markup into
//! [`CardDescriptor`]s. A card is any element whose `class` list contains
//! `card`. Explicit `data-*` attributes win; missing ones are backfilled
//! from the card's content:
//!
//! - `data-url` from the first `<a href>`
//! - `data-title` from the text of the `.title` element
//! - `data-description` from the text of the `.description` element
//! - icon from the `src` of the `.icon-image` image, else `data-icon`
//!
//! The registry is read-only once built.

use std::cmp::Ordering;
use std::collections::HashMap;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tracing::{debug, warn};

use crate::types::bookmark::CardDescriptor;
use crate::types::errors::CardError;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Sort keys for [`CardRegistry::sorted_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSort {
    Title,
    Category,
}

/// Trait defining card registry queries.
pub trait CardRegistryTrait {
    fn all(&self) -> &[CardDescriptor];
    fn get(&self, url: &str) -> Option<&CardDescriptor>;
    fn by_category(&self, category: &str) -> Vec<&CardDescriptor>;
    fn search(&self, term: &str) -> Vec<&CardDescriptor>;
    fn categories(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Default)]
pub struct CardRegistry {
    cards: Vec<CardDescriptor>,
    by_url: HashMap<String, usize>,
}

impl CardRegistry {
    /// Builds a registry from cards already in memory. Invalid cards are skipped.
    pub fn from_descriptors(cards: Vec<CardDescriptor>) -> Self {
        let mut registry = Self::default();
        for card in cards {
            registry.push(card);
        }
        registry
    }

    /// Parses page markup. Fails when the page has no usable card.
    pub fn from_html(html: &str) -> Result<Self, CardError> {
        let mut queue = BufferQueue::default();
        queue.push_back(StrTendril::from_slice(html));

        let mut tokenizer = Tokenizer::new(CardCollector::default(), TokenizerOpts::default());
        let _ = tokenizer.feed(&mut queue);
        tokenizer.end();

        let collector = tokenizer.sink;
        let registry = Self::from_descriptors(collector.cards);
        if registry.is_empty() {
            return Err(CardError::NoCards);
        }
        debug!(cards = registry.len(), "card registry built");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn position(&self, url: &str) -> Option<usize> {
        self.by_url.get(url).copied()
    }

    pub fn sorted_by(&self, key: CardSort, ascending: bool) -> Vec<&CardDescriptor> {
        let mut sorted: Vec<&CardDescriptor> = self.cards.iter().collect();
        sorted.sort_by(|a, b| {
            let ord = match key {
                CardSort::Title => compare_text(&a.title, &b.title),
                CardSort::Category => compare_text(&a.category, &b.category),
            };
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        sorted
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.cards).unwrap_or_else(|_| "[]".to_string())
    }

    fn push(&mut self, card: CardDescriptor) {
        if !card.is_valid() {
            warn!(url = %card.url, "skipping card without url or title");
            return;
        }
        let card = CardDescriptor {
            url: card.url.trim().to_string(),
            title: card.title.trim().to_string(),
            description: card.description.trim().to_string(),
            icon: card.icon.trim().to_string(),
            category: card.category.trim().to_string(),
        };
        // First card wins the lookup slot when a URL repeats.
        self.by_url.entry(card.url.clone()).or_insert(self.cards.len());
        self.cards.push(card);
    }
}

impl CardRegistryTrait for CardRegistry {
    fn all(&self) -> &[CardDescriptor] {
        &self.cards
    }

    fn get(&self, url: &str) -> Option<&CardDescriptor> {
        self.position(url).map(|i| &self.cards[i])
    }

    /// `all` returns every card.
    fn by_category(&self, category: &str) -> Vec<&CardDescriptor> {
        if category == "all" {
            return self.cards.iter().collect();
        }
        self.cards.iter().filter(|c| c.category == category).collect()
    }

    /// Case-insensitive substring match on title, description and URL.
    fn search(&self, term: &str) -> Vec<&CardDescriptor> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.cards.iter().collect();
        }
        self.cards.iter().filter(|c| card_matches(c, &term)).collect()
    }

    /// Distinct non-empty categories in document order.
    fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for card in &self.cards {
            if !card.category.is_empty() && !seen.contains(&card.category) {
                seen.push(card.category.clone());
            }
        }
        seen
    }
}

/// `term` must already be lowercased and trimmed.
pub fn card_matches(card: &CardDescriptor, term: &str) -> bool {
    card.title.to_lowercase().contains(term)
        || card.description.to_lowercase().contains(term)
        || card.url.to_lowercase().contains(term)
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn attr<'a>(tag: &'a Tag, name: &str) -> Option<&'a str> {
    tag.attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| &*a.value)
}

fn has_class(tag: &Tag, class: &str) -> bool {
    attr(tag, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Default)]
struct PendingCard {
    data_url: Option<String>,
    data_title: Option<String>,
    data_description: Option<String>,
    data_icon: Option<String>,
    category: String,
    href: Option<String>,
    img_src: Option<String>,
    title_text: Option<String>,
    description_text: Option<String>,
}

impl PendingCard {
    fn from_tag(tag: &Tag) -> Self {
        Self {
            data_url: non_empty(attr(tag, "data-url")),
            data_title: non_empty(attr(tag, "data-title")),
            data_description: non_empty(attr(tag, "data-description")),
            data_icon: non_empty(attr(tag, "data-icon")),
            category: attr(tag, "data-category").unwrap_or("").trim().to_string(),
            ..Self::default()
        }
    }

    fn finish(self) -> CardDescriptor {
        CardDescriptor {
            url: self.data_url.or(self.href).unwrap_or_default(),
            title: self
                .data_title
                .or_else(|| self.title_text.and_then(|t| non_empty(Some(&t))))
                .unwrap_or_default(),
            description: self
                .data_description
                .or_else(|| self.description_text.and_then(|t| non_empty(Some(&t))))
                .unwrap_or_default(),
            icon: self.img_src.or(self.data_icon).unwrap_or_default(),
            category: self.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Title,
    Description,
}

/// Token sink collecting cards while the tokenizer walks the page.
#[derive(Debug, Default)]
struct CardCollector {
    cards: Vec<CardDescriptor>,
    current: Option<PendingCard>,
    /// Open elements inside the current card, the card itself included.
    depth: usize,
    /// Text field being captured and the depth at which it opened.
    capture: Option<(TextField, usize)>,
}

impl CardCollector {
    fn start_tag(&mut self, tag: &Tag) {
        let is_void = tag.self_closing || VOID_ELEMENTS.contains(&&*tag.name);

        let Some(card) = self.current.as_mut() else {
            if has_class(tag, "card") && !is_void {
                self.current = Some(PendingCard::from_tag(tag));
                self.depth = 1;
            }
            return;
        };

        match &*tag.name {
            "a" if card.href.is_none() => card.href = non_empty(attr(tag, "href")),
            "img" if card.img_src.is_none() && has_class(tag, "icon-image") => {
                card.img_src = non_empty(attr(tag, "src"));
            }
            _ => {}
        }

        if is_void {
            return;
        }
        self.depth += 1;

        if self.capture.is_none() {
            if has_class(tag, "title") && card.title_text.is_none() {
                card.title_text = Some(String::new());
                self.capture = Some((TextField::Title, self.depth));
            } else if has_class(tag, "description") && card.description_text.is_none() {
                card.description_text = Some(String::new());
                self.capture = Some((TextField::Description, self.depth));
            }
        }
    }

    fn end_tag(&mut self) {
        if self.current.is_none() {
            return;
        }
        if let Some((_, level)) = self.capture {
            if self.depth == level {
                self.capture = None;
            }
        }
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            if let Some(card) = self.current.take() {
                self.cards.push(card.finish());
            }
            self.capture = None;
        }
    }

    fn text(&mut self, text: &str) {
        let (Some(card), Some((field, _))) = (self.current.as_mut(), self.capture) else {
            return;
        };
        let target = match field {
            TextField::Title => card.title_text.as_mut(),
            TextField::Description => card.description_text.as_mut(),
        };
        if let Some(buf) = target {
            buf.push_str(text);
        }
    }
}

impl TokenSink for CardCollector {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => self.start_tag(&tag),
                TagKind::EndTag => {
                    if !VOID_ELEMENTS.contains(&&*tag.name) {
                        self.end_tag();
                    }
                }
            },
            Token::CharacterTokens(text) => self.text(&text),
            Token::EOFToken => {
                // Unclosed card at end of input still counts.
                if let Some(card) = self.current.take() {
                    self.cards.push(card.finish());
                }
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}
