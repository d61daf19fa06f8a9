pub mod definition;
pub mod event;
pub mod item;
pub mod node;
pub mod player;
pub mod stats;
pub mod vocabulary;
