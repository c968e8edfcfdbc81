use serde::{Deserialize, Serialize};

/// One rendered favorite card, as handed to a `FavoritesSurface`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteCardView {
    pub index: usize,
    pub url: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Icon source after scheme whitelisting.
    pub icon_src: String,
    /// Placeholder swapped in when `icon_src` fails to load.
    pub fallback_icon: String,
    pub dragging: bool,
    pub drag_over: bool,
}

impl FavoriteCardView {
    /// Renders the card as markup. Every text and attribute value is escaped.
    pub fn to_html(&self) -> String {
        let mut classes = String::from("card");
        if !self.category.is_empty() {
            classes.push(' ');
            classes.push_str(&escape_html(&self.category));
        }
        if self.dragging {
            classes.push_str(" dragging");
        }
        if self.drag_over {
            classes.push_str(" drag-over");
        }

        format!(
            concat!(
                "<div class=\"{classes}\" data-url=\"{url}\" data-title=\"{title}\" ",
                "data-index=\"{index}\" draggable=\"true\">",
                "<button class=\"favorite-btn favorited\" aria-label=\"Remove from favorites\">",
                "<i class=\"fas fa-star\"></i></button>",
                "<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">",
                "<img class=\"icon-image\" src=\"{icon}\" data-fallback=\"{fallback}\" alt=\"{title}\" loading=\"lazy\">",
                "<span class=\"title\">{title}</span>",
                "<span class=\"description\">{description}</span>",
                "</a></div>"
            ),
            classes = classes,
            url = escape_html(&self.url),
            title = escape_html(&self.title),
            index = self.index,
            icon = escape_html(&self.icon_src),
            fallback = escape_html(&self.fallback_icon),
            description = escape_html(&self.description),
        )
    }
}

/// Escapes text for use in element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
