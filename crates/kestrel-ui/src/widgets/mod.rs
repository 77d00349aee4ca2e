//! Composite widgets built on the node tree.

pub mod msgbox;
