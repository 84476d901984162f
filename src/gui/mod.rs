pub mod control_panel;
pub mod image_view;
pub mod theme;
pub mod toolbar;
