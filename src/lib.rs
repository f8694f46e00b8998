// git-cloner: repository mirror sync
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |            sync / list / config
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          config           |
//!              | layered file/env/--set,   |
//!              | validated descriptors     |
//!              '-------------+-------------'
//!                            v
//!                          sync
//!                 per-repo state machine
//!                     |            |
//!                     v            v
//!                  remote        mirror
//!              GraphQL history  gix reads,
//!                (reqwest)      git CLI writes
//!
//!   +-----------------------------------------+
//!   |  foundation   error, logging, credential|
//!   +-----------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod credential;
pub mod error;
pub mod logging;
pub mod mirror;
pub mod remote;
pub mod sync;
