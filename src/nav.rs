use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Prediction,
    Subscription,
}

/// Named sections on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Education,
    Map,
    Hospitals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEffect {
    Render(Page),
    Scroll(Anchor),
    /// Home must render before the anchor exists.
    ScrollAfterRender(Anchor),
}

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Page,
}

impl Navigator {
    pub fn current(&self) -> Page {
        self.current
    }

    pub fn go(&mut self, page: Page) -> NavEffect {
        self.current = page;
        NavEffect::Render(page)
    }

    pub fn scroll_to(&mut self, anchor: Anchor) -> NavEffect {
        if self.current == Page::Home {
            NavEffect::Scroll(anchor)
        } else {
            self.current = Page::Home;
            NavEffect::ScrollAfterRender(anchor)
        }
    }

    pub fn is_active(&self, page: Page) -> bool {
        self.current == page
    }
}
