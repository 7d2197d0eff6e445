//! Call planning for the two DataPact entry points
//!
//! Both builders are stateless and never touch the network:
//! - create bounty: split the reward off the gas coin, then one Move call
//!   taking `name, file_names, blob_ids, allowed_labels, total_images, coin`
//! - submit label: one Move call taking `bounty, file_name, label`
//!
//! Input validity is the caller's job (see [`crate::validation`]); the only
//! check repeated here is the file/blob length match, since a mismatch would
//! be silently mis-paired on-chain.

use crate::config::ContractConfig;
use crate::tx_builder::call::{Argument, Command, MoveCall, ProgrammableCall};
use crate::tx_builder::errors::TransactionBuilderError;
use crate::types::{CreateBountyParams, SubmitLabelParams};
use tracing::debug;

fn move_call(
    contract: &ContractConfig,
    function: &str,
    type_arguments: Vec<String>,
    arguments: Vec<Argument>,
) -> Result<MoveCall, TransactionBuilderError> {
    if contract.package_id.trim().is_empty() {
        return Err(TransactionBuilderError::Configuration(
            "package id is not set".to_string(),
        ));
    }
    if contract.module.is_empty() || function.is_empty() {
        return Err(TransactionBuilderError::Configuration(
            "module and function names must be set".to_string(),
        ));
    }

    Ok(MoveCall {
        package: contract.package_id.clone(),
        module: contract.module.clone(),
        function: function.to_string(),
        type_arguments,
        arguments,
    })
}

/// Build the unsigned create-bounty call
///
/// The reward coin is carved from the gas coin for exactly
/// `params.reward_amount` MIST. `file_name_list` and `blob_ids` are passed in
/// the order given.
///
/// # Errors
///
/// - [`TransactionBuilderError::MismatchedPairing`] if the two lists differ in length
/// - [`TransactionBuilderError::Configuration`] if no call target can be formed
pub fn build_create_bounty_transaction(
    contract: &ContractConfig,
    params: &CreateBountyParams,
) -> Result<ProgrammableCall, TransactionBuilderError> {
    if params.file_name_list.len() != params.blob_ids.len() {
        return Err(TransactionBuilderError::MismatchedPairing {
            file_names: params.file_name_list.len(),
            blob_ids: params.blob_ids.len(),
        });
    }

    let mut call = ProgrammableCall::new();

    let reward = call
        .split_coins(Argument::GasCoin, &[params.reward_amount])
        .remove(0);

    let name = call.pure_string(params.name.as_str());
    let file_names = call.pure_string_vector(&params.file_name_list);
    let blob_ids = call.pure_string_vector(&params.blob_ids);
    let allowed_labels = call.pure_string_vector(&params.allowed_labels);
    let total_images = call.pure_u64(params.total_images);

    let target = move_call(
        contract,
        &contract.create_function,
        vec![contract.coin_type.clone()],
        vec![name, file_names, blob_ids, allowed_labels, total_images, reward],
    )?;
    call.move_call(target);

    sanity_check_call(&call)?;

    debug!(
        files = params.file_name_list.len(),
        labels = params.allowed_labels.len(),
        reward_mist = params.reward_amount,
        "Built create-bounty call"
    );

    Ok(call)
}

/// Build the unsigned submit-label call
///
/// The bounty is passed as a mutable object reference; no coins are moved.
/// `submit_label` is generic over the reward coin like the create call.
pub fn build_submit_label_transaction(
    contract: &ContractConfig,
    params: &SubmitLabelParams,
) -> Result<ProgrammableCall, TransactionBuilderError> {
    let mut call = ProgrammableCall::new();

    let bounty = call.object_mut(params.bounty_object_id.as_str());
    let file_name = call.pure_string(params.file_name.as_str());
    let label = call.pure_string(params.label.as_str());

    let target = move_call(
        contract,
        &contract.submit_function,
        vec![contract.coin_type.clone()],
        vec![bounty, file_name, label],
    )?;
    call.move_call(target);

    sanity_check_call(&call)?;

    debug!(bounty = %params.bounty_object_id, file = %params.file_name, "Built submit-label call");

    Ok(call)
}

/// Check that every argument points at something that exists
///
/// Only compiled in debug/test builds.
#[cfg(debug_assertions)]
pub fn sanity_check_call(call: &ProgrammableCall) -> Result<(), TransactionBuilderError> {
    let check = |argument: &Argument, position: usize| -> Result<(), TransactionBuilderError> {
        let valid = match *argument {
            Argument::GasCoin => true,
            Argument::Input(index) => (index as usize) < call.inputs.len(),
            Argument::Result(index) | Argument::NestedResult(index, _) => (index as usize) < position,
        };
        if valid {
            Ok(())
        } else {
            Err(TransactionBuilderError::Configuration(format!(
                "command {} references unknown argument {:?}",
                position, argument
            )))
        }
    };

    for (position, command) in call.commands.iter().enumerate() {
        match command {
            Command::SplitCoins { coin, amounts } => {
                check(coin, position)?;
                for amount in amounts {
                    check(amount, position)?;
                }
            }
            Command::MoveCall(target) => {
                for argument in &target.arguments {
                    check(argument, position)?;
                }
            }
        }
    }

    Ok(())
}

/// No-op version of sanity_check_call for release builds
#[cfg(not(debug_assertions))]
#[inline(always)]
pub fn sanity_check_call(_call: &ProgrammableCall) -> Result<(), TransactionBuilderError> {
    Ok(())
}
