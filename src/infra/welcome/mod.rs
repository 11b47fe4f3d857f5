pub mod http_compositor;

pub use http_compositor::HttpImageCompositor;
