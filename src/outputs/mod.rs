//! Output generation.
//!
//! # Submodules
//!
//! - [`post`]: Jekyll post files with front matter
//!
//! # Output Structure
//!
//! ```text
//! _posts/
//! ├── 2026-10-19-ai-news-daily.md
//! ├── 2026-10-19-study-sql-mysql.md
//! └── 2026-03-02-naver-223456789.md
//! .automation/
//! └── state.json                  # study rotation cursor
//! ```

pub mod post;
