//! CloudStack API interaction module
//!
//! This module provides the client used by the provider to query the
//! CloudStack management server.
//!
//! # Module Structure
//!
//! - [`auth`] - API key handling and HMAC-SHA1 request signing
//! - [`client`] - Main client and the [`VirtualMachineApi`] lookup seam
//! - [`error`] - Errors returned by API calls
//! - [`http`] - HTTP transport for signed API requests
//! - [`vm`] - Virtual machine records as returned by `listVirtualMachines`
//!
//! # Example
//!
//! ```ignore
//! use cloudstack_provider::cloudstack::{CloudStackClient, VirtualMachineApi};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let url = "https://cloud.example.com/client/api";
//!     let client = CloudStackClient::new(url, "key", "secret", true)?;
//!     let vm = client.virtual_machine_by_name("node-1", None).await?;
//!     println!("{} runs in {}", vm.name, vm.zone_name);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod vm;

pub use client::{CloudStackClient, VirtualMachineApi};
pub use error::ApiError;
pub use vm::{Nic, VirtualMachine};
