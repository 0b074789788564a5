//! C99 statement renderer

use std::fmt;

use super::{GenerationData, Language, MaterializationPolicy};
use crate::core::{Argument, ChainOp, Node, NodeId, OpCode};
use crate::error::{CodeGenError, Result};
use crate::traits::MathScalar;

/// Renders the evaluation order as C assignments.
///
/// Comparison selects are always stored in their own variable and printed
/// as ternaries; `sign` needs a stored argument because it reads it twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CLanguage {
    base_type: String,
    indentation: String,
}

impl Default for CLanguage {
    fn default() -> Self {
        Self::new("double")
    }
}

impl CLanguage {
    pub fn new(base_type: impl Into<String>) -> Self {
        Self {
            base_type: base_type.into(),
            indentation: "   ".to_owned(),
        }
    }

    pub fn with_indentation(mut self, indentation: impl Into<String>) -> Self {
        self.indentation = indentation.into();
        self
    }

    pub fn base_type(&self) -> &str {
        &self.base_type
    }

    fn format_parameter<B: MathScalar>(value: B) -> String {
        if value.is_nan() {
            "NAN".to_owned()
        } else if value.is_infinite() {
            if value.is_sign_negative() {
                "(-INFINITY)".to_owned()
            } else {
                "INFINITY".to_owned()
            }
        } else if value.is_sign_negative() && value != B::zero() {
            format!("({value:e})")
        } else {
            format!("{value:e}")
        }
    }

    /// Text of an argument as seen by its consumer
    fn print_argument<B: MathScalar>(
        &self,
        data: &GenerationData<'_, B>,
        arg: Argument<B>,
    ) -> Result<String> {
        let id = match arg {
            Argument::Param(value) => return Ok(Self::format_parameter(value)),
            Argument::Node(id) => id,
        };
        if let Some(name) = data.variable_name(id) {
            return Ok(name);
        }
        let node = Self::node(data, id)?;
        match node.op() {
            OpCode::Alias => self.print_argument(data, node.args()[0]),
            op if op.is_unary_function() || op == OpCode::Pow => self.print_operation(data, id),
            _ => Ok(format!("({})", self.print_operation(data, id)?)),
        }
    }

    /// Text of an argument used as a function-call operand: no outer parentheses
    fn print_call_argument<B: MathScalar>(
        &self,
        data: &GenerationData<'_, B>,
        arg: Argument<B>,
    ) -> Result<String> {
        match arg {
            Argument::Node(id) if data.variable_name(id).is_none() => {
                let node = Self::node(data, id)?;
                if node.op() == OpCode::Alias {
                    self.print_call_argument(data, node.args()[0])
                } else {
                    self.print_operation(data, id)
                }
            }
            _ => self.print_argument(data, arg),
        }
    }

    fn node<'d, B: MathScalar>(data: &'d GenerationData<'_, B>, id: NodeId) -> Result<&'d Node<B>> {
        data.node(id).ok_or(CodeGenError::ForeignNode)
    }

    /// Expression computing `id` itself
    fn print_operation<B: MathScalar>(
        &self,
        data: &GenerationData<'_, B>,
        id: NodeId,
    ) -> Result<String> {
        let node = Self::node(data, id)?;
        let call = node.op().is_unary_function() || node.op() == OpCode::Pow;
        let args = node
            .args()
            .iter()
            .map(|&a| {
                if call {
                    self.print_call_argument(data, a)
                } else {
                    self.print_argument(data, a)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let text = match node.op() {
            OpCode::Add => format!("{} + {}", args[0], args[1]),
            OpCode::Sub => format!("{} - {}", args[0], args[1]),
            OpCode::Mul => format!("{} * {}", args[0], args[1]),
            OpCode::Div => format!("{} / {}", args[0], args[1]),
            OpCode::AddSub | OpCode::MulDiv => {
                let mut text = String::new();
                for (i, (arg, tag)) in args.iter().zip(node.chain()).enumerate() {
                    match (i, tag) {
                        (0, ChainOp::Add | ChainOp::Mul) => text.push_str(arg),
                        (0, ChainOp::Sub) => text.push_str(&format!("-{arg}")),
                        (0, ChainOp::Div) => text.push_str(&format!("1 / {arg}")),
                        (_, tag) => text.push_str(&format!(" {} {arg}", tag.symbol())),
                    }
                }
                text
            }
            OpCode::UnMinus => format!("-{}", args[0]),
            OpCode::Pow => format!("pow({}, {})", args[0], args[1]),
            OpCode::Abs => format!("fabs({})", args[0]),
            OpCode::Sign => {
                let v = &args[0];
                format!("({v} > 0 ? 1 : ({v} == 0 ? 0 : -1))")
            }
            OpCode::Alias => args[0].clone(),
            op if op.is_unary_function() => format!("{}({})", op.name(), args[0]),
            op => match op.compare_op() {
                Some(cmp) => format!(
                    "{} {} {} ? {} : {}",
                    args[0],
                    cmp.symbol(),
                    args[1],
                    args[2],
                    args[3]
                ),
                None => {
                    return Err(CodeGenError::unsupported(format!(
                        "'{op}' cannot be rendered as an expression"
                    )));
                }
            },
        };
        Ok(text)
    }
}

impl<B: MathScalar> MaterializationPolicy<B> for CLanguage {
    fn creates_new_variable(&self, node: &Node<B>) -> bool {
        node.total_ref_count() > 1 || node.op().is_comparison()
    }

    fn requires_variable_argument(&self, op: OpCode, _arg_index: usize) -> bool {
        op == OpCode::Sign
    }
}

impl<B: MathScalar> Language<B> for CLanguage {
    fn generate_source_code(
        &self,
        out: &mut dyn fmt::Write,
        data: &GenerationData<'_, B>,
    ) -> Result<()> {
        let ind = &self.indentation;

        let temporaries = data.temporary_count();
        if temporaries > 0 {
            if let Some(array) = data.names().temporary_array() {
                writeln!(out, "{ind}{} {array}[{temporaries}];", self.base_type)?;
            }
        }

        for &id in data.variable_order() {
            let Some(name) = data.variable_name(id) else {
                return Err(CodeGenError::unsupported("scheduled operation without a variable"));
            };
            writeln!(out, "{ind}{name} = {};", self.print_operation(data, id)?)?;
        }

        // outputs that were not computed in place
        for (index, &output) in data.outputs().iter().enumerate() {
            if let Argument::Node(id) = output {
                if data.dependent_index(id) == Some(index) {
                    continue;
                }
            }
            writeln!(
                out,
                "{ind}{} = {};",
                data.names().dependent_name(index),
                self.print_argument(data, output)?
            )?;
        }
        Ok(())
    }
}
