//! # services
//!
//! Portal behaviour on top of the domain ports: request submission and
//! voting, the request board, catalog browsing with download gating, live
//! search, admin CRUD, the visitor counter and session resolution.
//!
//! Services never talk HTTP themselves. They receive `Arc<dyn Port>`
//! implementations and an explicit [`domains::Session`] per call.

pub mod admin;
pub mod board;
pub mod catalog;
pub mod notices;
pub mod requests;
pub mod search;
pub mod session;
pub mod slug;
pub mod visitors;
pub mod voting;

pub use admin::AdminService;
pub use board::{BoardSection, BoardView, RequestBoard, RequestCard};
pub use catalog::{CardAccess, CatalogCard, CatalogFilterForm, CatalogService, CatalogView};
pub use requests::{RequestForm, RequestService, SubmissionView};
pub use search::{SearchHit, SearchService};
pub use session::SessionResolver;
pub use visitors::{VisitRecord, VisitorService};
pub use voting::{VoteOutcome, VoteService};
