use bon::bon;
use simtlower_ir::OpId;
use simtlower_layout::Type;

/// Host operation as seen by lowering: identity, static types and effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub id: OpId,
    pub name: String,
    pub operand_types: Vec<Type>,
    pub result_types: Vec<Type>,
    pub memory_effect_free: bool,
}

#[bon]
impl Operation {
    #[builder]
    pub fn builder(
        id: OpId,
        #[builder(into)] name: String,
        #[builder(default)] operand_types: Vec<Type>,
        #[builder(default)] result_types: Vec<Type>,
        #[builder(default = true)] memory_effect_free: bool,
    ) -> Self {
        Self { id, name, operand_types, result_types, memory_effect_free }
    }

    /// Type of the single result, if there is exactly one.
    pub fn result_type(&self) -> Option<&Type> {
        match self.result_types.as_slice() {
            [ty] => Some(ty),
            _ => None,
        }
    }
}
