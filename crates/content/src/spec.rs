//! Plain-data form of a task library.

use std::collections::BTreeMap;

use htn::{
    CompoundTask, ConfigError, Domain, DomainBuilder, OperatorRegistry, PrimitiveSpec,
    ProviderRegistry, TaskId, ValueKind,
};

/// A task library as written in a content file.
///
/// ```ron
/// (
///     keys: { "hp": Int, "target": Entity },
///     primitives: [
///         (id: "strike", operator: "attack", preconditions: [IsSet("target")]),
///     ],
///     compounds: [
///         (id: "fight", methods: [(name: "melee", subtasks: ["strike"])]),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DomainSpec {
    pub keys: BTreeMap<String, ValueKind>,
    pub primitives: Vec<PrimitiveSpec>,
    pub compounds: Vec<CompoundTask>,
}

impl DomainSpec {
    /// Compound task ids, i.e. the goals an agent can be given.
    pub fn goals(&self) -> impl Iterator<Item = &TaskId> + '_ {
        self.compounds.iter().map(|c| &c.id)
    }

    /// Feeds every definition into a [`DomainBuilder`]. Operators are
    /// resolved by name when the builder is built.
    pub fn into_builder<W>(self) -> DomainBuilder<W> {
        let mut builder = Domain::builder();
        for (key, kind) in self.keys {
            builder = builder.key(key, kind);
        }
        for primitive in self.primitives {
            builder = builder.primitive_spec(primitive);
        }
        for compound in self.compounds {
            builder = builder.compound(compound);
        }
        builder
    }

    /// Validates the definitions against the collaborator's operators and
    /// providers and builds the domain.
    pub fn build<W>(
        self,
        operators: &OperatorRegistry<W>,
        providers: &ProviderRegistry<W>,
    ) -> Result<Domain<W>, ConfigError> {
        self.into_builder().build_with(operators, providers)
    }
}

#[cfg(test)]
mod tests {
    use htn::{Method, OperatorContext, TaskStatus};

    use super::*;

    struct World;

    fn wait(_: &mut OperatorContext<'_, World>) -> TaskStatus {
        TaskStatus::Success
    }

    fn spec() -> DomainSpec {
        DomainSpec {
            keys: BTreeMap::from([("bored".to_string(), ValueKind::Flag)]),
            primitives: vec![PrimitiveSpec::new("nap", "wait")],
            compounds: vec![CompoundTask::new("idle").method(Method::new("rest", ["nap"]))],
        }
    }

    #[test]
    fn builds_with_named_operators() {
        let operators = OperatorRegistry::new().with("wait", wait).unwrap();
        let domain = spec().build(&operators, &ProviderRegistry::new()).unwrap();

        assert_eq!(domain.len(), 2);
        assert!(domain.schema().contains("bored"));
        assert_eq!(spec().goals().map(TaskId::as_str).collect::<Vec<_>>(), ["idle"]);
    }

    #[test]
    fn missing_operator_is_a_config_error() {
        let err = spec()
            .build::<World>(&OperatorRegistry::new(), &ProviderRegistry::new())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::UnknownOperator { .. }));
    }
}
