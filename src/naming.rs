//! @ai:module:intent Fixed names shared by the extractor and the renderer
//! @ai:module:layer domain
//! @ai:module:stateless true

// Block construct tags
pub const DECLARE_STATE: &str = "DeclareState";
pub const INTERFACE: &str = "Interface";
pub const PRE_CONDITION: &str = "PreCondition";
pub const JUSTIFYING_PRECONDITION: &str = "JustifyingPrecondition";
pub const TRANSITION: &str = "Transition";
pub const SIDE_EFFECT: &str = "SideEffect";
pub const JUSTIFYING_POSTCONDITION: &str = "JustifyingPostcondition";
pub const POST_CONDITION: &str = "PostCondition";
pub const DEFINE: &str = "Define";

// Global state primitives
pub const INITIAL_STATE: &str = "Initial";
pub const COPY_STATE: &str = "Copy";
pub const CLEAR_STATE: &str = "Clear";
pub const FINAL_STATE: &str = "Final";
pub const PRINT_STATE: &str = "Print";
pub const COMMUTATIVITY: &str = "Commutativity";

/// Interface print primitive; same spelling as the global one.
pub const PRINT_VALUE: &str = "Print";

// One-line construct tags
pub const ENTRY: &str = "Entry";
pub const OP_DEFINE: &str = "OPDefine";
pub const POTENTIAL_OP: &str = "PotentialOP";
pub const OP_CHECK: &str = "OPCheck";
pub const OP_CLEAR: &str = "OPClear";
pub const OP_CLEAR_DEFINE: &str = "OPClearDefine";
pub const OP_DEFINE_UNATTACHED: &str = "OPDefineUnattached";
pub const OP_CLEAR_DEFINE_UNATTACHED: &str = "OPClearDefineUnattached";

// Generated artifacts
pub const GENERATED_HEADER: &str = "cdsspec-generated.h";
pub const GENERATED_SOURCE: &str = "cdsspec-generated.cc";

// Identifiers used inside generated code
pub const WRAPPER_PREFIX: &str = "__wrapper_";
pub const C_RET: &str = "RET";
pub const NEW_STATE_INST: &str = "NEW";
pub const OLD_STATE_INST: &str = "OLD";
pub const STATE_STRUCT: &str = "StateStruct";
pub const METHOD: &str = "Method";
pub const METHOD_INST: &str = "_M";
pub const PRINT: &str = "model_print";
pub const PRINT_CONTAINER: &str = "printContainer";
pub const PRINT_MAP: &str = "printMap";

/// Headers the generated header includes on its own.
pub const PRE_INCLUDED_HEADERS: [&str; 10] = [
    "<atomic>",
    "<threads.h>",
    "<stdatomic.h>",
    "<cdsannotate.h>",
    "<modeltypes.h>",
    "\"mymemory.h\"",
    "\"specannotation.h\"",
    "\"cdsspec.h\"",
    "\"methodcall.h\"",
    "\"cdsspec-generated.h\"",
];

pub fn is_pre_included_header(header: &str) -> bool {
    PRE_INCLUDED_HEADERS.contains(&header)
}

/// @ai:intent Mangle an interface label into the name of its value struct
/// @ai:example ("Push") -> "__struct_Push__"
pub fn struct_name(label: &str) -> String {
    format!("__struct_{}__", label)
}

/// @ai:intent Mangle a bare function name into its wrapper name
/// @ai:example ("push") -> "__wrapper__push"
pub fn wrapper_name(bare_name: &str) -> String {
    format!("{}_{}", WRAPPER_PREFIX, bare_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangling() {
        assert_eq!(struct_name("Push"), "__struct_Push__");
        assert_eq!(wrapper_name("enqueue"), "__wrapper__enqueue");
    }

    #[test]
    fn test_generated_header_is_pre_included() {
        assert!(is_pre_included_header("\"cdsspec-generated.h\""));
        assert!(!is_pre_included_header("\"my_queue.h\""));
    }
}
