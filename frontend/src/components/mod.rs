pub mod chart_menu;
pub mod chart_plotly;
pub mod incubators;
pub mod login;
pub mod monitor;
pub mod summary;
