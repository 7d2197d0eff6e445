//! Transaction builder
//!
//! Pure construction of the unsigned calls the DataPact contract accepts.
//!
//! - **call**: programmable call model (inputs, commands, arguments)
//! - **instructions**: create-bounty and submit-label planning
//! - **errors**: builder error taxonomy
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use datapact_client::config::ContractConfig;
//! use datapact_client::tx_builder::build_submit_label_transaction;
//! use datapact_client::types::SubmitLabelParams;
//!
//! # fn example() -> Result<(), datapact_client::tx_builder::TransactionBuilderError> {
//! let contract = ContractConfig { package_id: "0xfeed".into(), ..Default::default() };
//! let call = build_submit_label_transaction(&contract, &SubmitLabelParams {
//!     bounty_object_id: "0xb0b".into(),
//!     file_name: "a.jpg".into(),
//!     label: "cat".into(),
//! })?;
//! println!("{}", serde_json::to_string_pretty(&call).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod errors;
pub mod instructions;

pub use call::{Argument, CallInput, Command, MoveCall, ProgrammableCall, PureValue};
pub use errors::TransactionBuilderError;
pub use instructions::{build_create_bounty_transaction, build_submit_label_transaction};
