// Application layer - Use case interactors

pub mod container;
pub mod project_interactor;
pub mod render_interactor;
pub mod session;
pub mod synthesize_interactor;
pub mod worker;

// Re-export interactors
pub use project_interactor::ProjectInteractor;
pub use render_interactor::RenderInteractor;
pub use session::Session;
pub use synthesize_interactor::SynthesizeInteractor;
pub use worker::{EventSender, JobEvent, JobRunner};
