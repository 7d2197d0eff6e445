//! Unsigned programmable call model
//!
//! A [`ProgrammableCall`] is an ordered list of inputs plus an ordered list
//! of commands that reference those inputs (or the results of earlier
//! commands) through [`Argument`]. It carries no sender, gas budget or
//! signature: the wallet boundary fills those in when it signs.

use serde::{Deserialize, Serialize};

/// Reference to a value available inside the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Argument {
    /// The coin paying for gas
    GasCoin,
    /// Input at the given index
    Input(u16),
    /// Whole result of the command at the given index
    Result(u16),
    /// One value of a command that returns several
    NestedResult(u16, u16),
}

/// Pure (non-object) argument value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PureValue {
    String(String),
    StringVector(Vec<String>),
    U64(u64),
}

/// Call input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CallInput {
    Pure {
        value: PureValue,
    },
    #[serde(rename_all = "camelCase")]
    Object {
        object_id: String,
        mutable: bool,
    },
}

/// Move function invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCall {
    pub package: String,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Argument>,
}

impl MoveCall {
    /// `package::module::function`
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

/// One step of the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Carve new coins of the given amounts out of `coin`
    SplitCoins { coin: Argument, amounts: Vec<Argument> },
    MoveCall(MoveCall),
}

/// Unsigned call ready to hand to the wallet boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammableCall {
    pub inputs: Vec<CallInput>,
    pub commands: Vec<Command>,
}

impl ProgrammableCall {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_input(&mut self, input: CallInput) -> Argument {
        self.inputs.push(input);
        Argument::Input((self.inputs.len() - 1) as u16)
    }

    fn push_command(&mut self, command: Command) -> u16 {
        self.commands.push(command);
        (self.commands.len() - 1) as u16
    }

    pub fn pure_string(&mut self, value: impl Into<String>) -> Argument {
        self.push_input(CallInput::Pure {
            value: PureValue::String(value.into()),
        })
    }

    pub fn pure_string_vector(&mut self, values: &[String]) -> Argument {
        self.push_input(CallInput::Pure {
            value: PureValue::StringVector(values.to_vec()),
        })
    }

    pub fn pure_u64(&mut self, value: u64) -> Argument {
        self.push_input(CallInput::Pure {
            value: PureValue::U64(value),
        })
    }

    /// Shared or owned object passed by mutable reference
    pub fn object_mut(&mut self, object_id: impl Into<String>) -> Argument {
        self.push_input(CallInput::Object {
            object_id: object_id.into(),
            mutable: true,
        })
    }

    /// Split `amounts` off `coin`; returns one argument per new coin
    pub fn split_coins(&mut self, coin: Argument, amounts: &[u64]) -> Vec<Argument> {
        let amount_args: Vec<Argument> = amounts.iter().map(|amount| self.pure_u64(*amount)).collect();
        let index = self.push_command(Command::SplitCoins {
            coin,
            amounts: amount_args,
        });
        (0..amounts.len())
            .map(|nested| Argument::NestedResult(index, nested as u16))
            .collect()
    }

    pub fn move_call(&mut self, call: MoveCall) -> Argument {
        Argument::Result(self.push_command(Command::MoveCall(call)))
    }

    /// Resolve an argument to its input, if it refers to one
    pub fn input(&self, argument: Argument) -> Option<&CallInput> {
        match argument {
            Argument::Input(index) => self.inputs.get(index as usize),
            _ => None,
        }
    }

    /// All Move calls in command order
    pub fn move_calls(&self) -> impl Iterator<Item = &MoveCall> {
        self.commands.iter().filter_map(|command| match command {
            Command::MoveCall(call) => Some(call),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_are_indexed_in_order() {
        let mut call = ProgrammableCall::new();
        assert_eq!(call.pure_string("a"), Argument::Input(0));
        assert_eq!(call.pure_u64(7), Argument::Input(1));
        assert_eq!(call.object_mut("0x1"), Argument::Input(2));

        assert_eq!(
            call.input(Argument::Input(1)),
            Some(&CallInput::Pure { value: PureValue::U64(7) })
        );
        assert_eq!(call.input(Argument::GasCoin), None);
    }

    #[test]
    fn test_split_coins_returns_nested_results() {
        let mut call = ProgrammableCall::new();
        let coins = call.split_coins(Argument::GasCoin, &[10, 20]);

        assert_eq!(coins, vec![Argument::NestedResult(0, 0), Argument::NestedResult(0, 1)]);
        assert_eq!(call.inputs.len(), 2);
        assert!(matches!(
            &call.commands[0],
            Command::SplitCoins { coin: Argument::GasCoin, amounts } if amounts.len() == 2
        ));
    }

    #[test]
    fn test_move_call_target() {
        let call = MoveCall {
            package: "0xabc".into(),
            module: "datapact".into(),
            function: "submit_label".into(),
            type_arguments: vec![],
            arguments: vec![],
        };
        assert_eq!(call.target(), "0xabc::datapact::submit_label");
    }

    #[test]
    fn test_json_shape() {
        let mut call = ProgrammableCall::new();
        let bounty = call.object_mut("0xb");
        call.move_call(MoveCall {
            package: "0xp".into(),
            module: "m".into(),
            function: "f".into(),
            type_arguments: vec!["0x2::sui::SUI".into()],
            arguments: vec![bounty],
        });

        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["inputs"][0]["kind"], "object");
        assert_eq!(json["inputs"][0]["objectId"], "0xb");
        assert_eq!(json["commands"][0]["MoveCall"]["typeArguments"][0], "0x2::sui::SUI");
        assert_eq!(json["commands"][0]["MoveCall"]["arguments"][0]["Input"], 0);
    }
}
