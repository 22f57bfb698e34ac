pub mod controller;
pub mod domain;
pub mod editor;
pub mod generator;
pub mod import;
pub mod inputter;
pub mod location;
pub mod logging;
pub mod model;
pub mod photo;
pub mod record;
pub mod store;
pub mod table;
pub mod ui;
