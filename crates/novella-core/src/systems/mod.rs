pub mod assets;
pub mod renderer;
pub mod window;

pub use assets::FontSet;
pub use renderer::Compositor;
pub use window::WindowStage;
