//! Errors raised anywhere in the compilation pipeline.

/// Errors arising from task-instance expansion, runtime-annotation
/// construction, graph assembly, constraint extraction, or valid-mission
/// enumeration.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A registry-level error (unknown sort, duplicate task, ...).
    #[error(transparent)]
    Registry(#[from] mdc_registry::RegistryError),

    /// A world-state or knowledge-base error.
    #[error(transparent)]
    World(#[from] mdc_world::WorldError),

    /// A configuration resolution or validation error.
    #[error(transparent)]
    Config(#[from] mdc_config::ConfigError),

    /// A graph construction error (TDG or ATGraph).
    #[error(transparent)]
    Graph(#[from] mdc_graph::GraphError),

    /// A constraint-extraction error.
    #[error(transparent)]
    Composition(#[from] mdc_compose::CompositionError),

    /// A goal-model node's query expression, forAll binding, or task
    /// reference used a variable that was never bound in an enclosing
    /// scope.
    #[error("unbound variable {var} at node {node}")]
    UnboundVariable {
        /// The offending variable name.
        var: String,
        /// The goal-model node id where it was referenced.
        node: String,
    },

    /// A `Query` goal's select expression could not be evaluated against
    /// the knowledge base (unknown predicate, type mismatch, dangling
    /// reference).
    #[error("invalid query at node {0}")]
    InvalidQuery(String),

    /// A goal's context requirement holds in no reachable world and no
    /// earlier task in its annotation subtree can be made to establish it.
    #[error("unsatisfied context for goal {0}")]
    UnsatisfiedContext(String),

    /// The valid-mission enumerator exhausted every decomposition
    /// candidate at some abstract task instance without finding one
    /// consistent with the live world and active constraints.
    #[error("no valid decomposition for task instance {0}")]
    NoValidDecomposition(String),

    /// A candidate mission violated the achieve-condition of an `Achieve`
    /// goal at the point its scope closed.
    #[error("achieve-condition violated for goal {0}")]
    AchieveConditionViolated(String),

    /// Two `PAR` siblings committed effects on the same grounded
    /// predicate with opposite sign and neither could be discarded.
    #[error("conflicting parallel effects between {a} and {b}")]
    ConflictingParallelEffects {
        /// First task-instance id.
        a: String,
        /// Second task-instance id.
        b: String,
    },

    /// A goal-model node's attribute or relationship had no corresponding
    /// semantic mapping in the configuration.
    #[error("semantic mapping missing for {0}")]
    SemanticMappingMissing(String),

    /// A value did not match its declared sort or a comparison mixed
    /// incompatible scalar kinds.
    #[error("type error: {0}")]
    TypeError(String),

    /// The domain itself is malformed (method references a task that
    /// doesn't exist, ordering is not a partial order, etc.) independent
    /// of any particular mission.
    #[error("bad domain: {0}")]
    BadDomain(String),

    /// An `Or`-decomposed goal was wrapped in a `SEQ` runtime annotation,
    /// which cannot be resolved to a single ordering since branches are
    /// mutually exclusive alternatives, not ordered steps.
    #[error("cycle in wrapper: OR-decomposed goal {0} wrapped in SEQ")]
    CycleInWrapper(String),
}
