//! Data models for the Local Library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod form;
pub mod genre;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorForm};
pub use book::{Book, BookForm, BookSummary};
pub use book_instance::{BookInstance, LoanStatus, LoanedInstance};
pub use form::{FieldErrors, FormOutcome};
pub use genre::{Genre, Language};
pub use page::{Page, PageQuery, PageRequest};
pub use user::{User, UserClaims};
