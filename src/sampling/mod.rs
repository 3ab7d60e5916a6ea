mod handle;
mod pointer_loop;
mod window_loop;

pub use handle::SamplerHandle;
pub use pointer_loop::pointer_sampler_loop;
pub use window_loop::window_watcher_loop;
