//! # tabledb - a miniature query engine over tab-separated table files
//!
//! Statements in a small SQL-like language are lexed, parsed into a closed
//! command type and applied to flat per-table files:
//! - **Nine commands**: USE, CREATE, DROP, ALTER, INSERT, SELECT, UPDATE,
//!   DELETE and JOIN
//! - **Conditions**: single terms or flat AND/OR groups of terms
//! - **Storage**: one directory per database, one `<table>.tab` file per table
//! - **TCP Server**: one session per client connection
//!
//! ## Architecture Overview
//!
//! 1. **Server Layer** (`server` module): TCP connections and the line protocol
//! 2. **SQL Layer** (`sql` module): lexer, cursor, parser and response rendering
//! 3. **Engine Layer** (`engine` module): table model, table files, condition
//!    evaluation and the nine operations
//!
//! ## Usage Example
//!
//! ```bash
//! # Start the server
//! cargo run -- --root ./databases --listen 127.0.0.1:8888
//!
//! # Talk to it
//! printf "CREATE DATABASE school;\nCREATE TABLE marks (name, mark);\n" | nc 127.0.0.1 8888
//! ```

/// Error taxonomy shared by every layer
pub mod error;

/// TCP server and client connection handling
pub mod server;

/// Table model, storage and the operation engine
pub mod engine;

/// Lexing, parsing and statement dispatch
pub mod sql;
