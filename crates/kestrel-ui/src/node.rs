//! Node kinds and their capabilities.
//!
//! Every node in the tree is the same [`UiNode`](crate::tree::UiNode) record;
//! what it can do is decided by its [`NodeKind`] variant and the
//! [`Capabilities`] that variant carries.

use crate::widgets::msgbox::MsgBoxParts;
use bitflags::bitflags;

bitflags! {
    /// What a node kind supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Receives clicks; clicks on other nodes go to the nearest clickable ancestor.
        const CLICKABLE = 0b0000_0001;
        /// Holds one or more text strings.
        const TEXT_HOLDER = 0b0000_0010;
        /// May own child nodes.
        const CONTAINER = 0b0000_0100;
    }
}

/// Text label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Label {
    text: String,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. Returns `true` if it changed.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.text == text {
            return false;
        }
        self.text = text;
        true
    }
}

/// A row of text buttons sharing a single active-index selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonRow {
    texts: Vec<String>,
    active: Option<usize>,
}

impl ButtonRow {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            active: None,
        }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn button_text(&self, index: usize) -> Option<&str> {
        self.texts.get(index).map(String::as_str)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.texts.iter().map(String::as_str)
    }

    /// Index of the last clicked button, `None` until one is clicked.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Set the active button. Out-of-range indices are rejected and return
    /// `false`; otherwise returns whether the selection changed.
    pub fn set_active(&mut self, index: Option<usize>) -> bool {
        if let Some(i) = index
            && i >= self.texts.len()
        {
            return false;
        }
        let changed = self.active != index;
        self.active = index;
        changed
    }
}

/// Tagged node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Top-level root for ordinary content.
    Screen,
    /// Top-level root stacked above every screen; hosts modal overlays.
    Layer,
    /// Plain container.
    Container,
    /// Text label.
    Label(Label),
    /// Clickable button; its caption is a child label.
    Button,
    /// Row of text buttons.
    ButtonRow(ButtonRow),
    /// Root of a composed message box.
    MsgBox(MsgBoxParts),
}

impl NodeKind {
    pub fn label(text: impl Into<String>) -> Self {
        NodeKind::Label(Label::new(text))
    }

    pub fn button_row<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodeKind::ButtonRow(ButtonRow::new(texts))
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Screen => "screen",
            NodeKind::Layer => "layer",
            NodeKind::Container => "container",
            NodeKind::Label(_) => "label",
            NodeKind::Button => "button",
            NodeKind::ButtonRow(_) => "button row",
            NodeKind::MsgBox(_) => "message box",
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            NodeKind::Screen | NodeKind::Layer | NodeKind::Container | NodeKind::MsgBox(_) => {
                Capabilities::CONTAINER
            }
            NodeKind::Label(_) => Capabilities::TEXT_HOLDER,
            NodeKind::Button => Capabilities::CLICKABLE | Capabilities::CONTAINER,
            NodeKind::ButtonRow(_) => Capabilities::CLICKABLE | Capabilities::TEXT_HOLDER,
        }
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities().contains(capability)
    }
}
