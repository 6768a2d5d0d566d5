//! @ai:module:intent Turn validated constructs into the C/C++ text that gets emitted
//! @ai:module:layer application
//! @ai:module:public_api Renderer, CdsSpecRenderer
//! @ai:module:depends_on code, construct, extractor, naming

use crate::code::Code;
use crate::construct::{
    CommutativityRule, DefineConstruct, EntryConstruct, InterfaceConstruct, OpConstruct, OpKind,
};
use crate::extractor::SpecModel;
use crate::naming::{self, C_RET, GENERATED_HEADER, METHOD, METHOD_INST, STATE_STRUCT};

/// @ai:intent Produces the generated code for each construct and the aggregate files
pub trait Renderer {
    /// Code inserted right after an ordering point annotation.
    fn render_op(&self, op: &OpConstruct) -> Code;

    /// Code inserted right after the `@Entry` annotation.
    fn render_entry(&self, entry: &EntryConstruct) -> Code;

    /// Code inserted after a `@Define` comment block.
    fn render_define(&self, define: &DefineConstruct) -> Code;

    /// Wrapper definition inserted after the body of the renamed interface function.
    fn render_interface_wrapper(&self, interface: &InterfaceConstruct) -> Code;

    fn render_header_file(&self, model: &SpecModel) -> Code;

    fn render_companion_source(&self, model: &SpecModel) -> Code;
}

/// @ai:intent Renderer targeting the CDSSpec checker runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct CdsSpecRenderer;

const INIT_FUNCTION: &str = "_createInitAnnotation";
const INTERFACE_BEGIN_FUNCTION: &str = "_createInterfaceBeginAnnotation";
const HEADER_GUARD: &str = "_CDSSPEC_GENERATED_H";

fn banner(text: &str) -> String {
    format!("/**********    {}    **********/", text)
}

fn include(header: &str) -> String {
    format!("#include {}", header)
}

fn op_function(kind: OpKind) -> &'static str {
    match kind {
        OpKind::Define => "_createOPDefineAnnotation",
        OpKind::PotentialDefine => "_createPotentialOPAnnotation",
        OpKind::Check => "_createOPCheckAnnotation",
        OpKind::Clear => "_createOPClearAnnotation",
        OpKind::ClearDefine => "_createOPClearDefineAnnotation",
        OpKind::DefineUnattached => "_createOPDefineUnattachedAnnotation",
        OpKind::ClearDefineUnattached => "_createOPClearDefineUnattachedAnnotation",
    }
}

/// A function definition with an aligned body.
fn function(signature: &str, body: &Code) -> Code {
    let mut aligned = body.clone();
    aligned.align(1);
    let mut code = Code::new();
    code.add_line(format!("{} {{", signature));
    code.append(&aligned);
    code.add_line("}");
    code
}

/// Name of a generated per-interface function, e.g. `_enq_transition`.
fn interface_function(label: &str, suffix: &str) -> String {
    format!("_{}_{}", label, suffix)
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

impl CdsSpecRenderer {
    pub fn new() -> Self {
        Self
    }

    fn state_struct(&self, model: &SpecModel) -> Code {
        let mut code = Code::new();
        code.add_line(format!("typedef struct {} {{", STATE_STRUCT));
        for field in &model.global.declared_state {
            code.add_line(format!("\t{};", field));
        }
        code.add_line("");
        code.add_line("\tSNAPSHOTALLOC");
        code.add_line(format!("}} {};", STATE_STRUCT));
        code
    }

    fn value_struct(&self, interface: &InterfaceConstruct) -> Code {
        let header = &interface.header;
        let mut code = Code::new();
        code.add_line(format!("typedef struct {} {{", interface.struct_name));
        if !header.is_return_void() {
            code.add_line(format!("\t{} {};", header.return_type, C_RET));
        }
        for arg in &header.args {
            code.add_line(format!("\t{};", arg));
        }
        code.add_line("");
        code.add_line("\tSNAPSHOTALLOC");
        code.add_line(format!("}} {};", interface.struct_name));
        code
    }

    /// `#define field (state->field)` for every state field, and the matching `#undef`s.
    fn field_macros(&self, names: &[String], target: &str) -> (Code, Code) {
        let define = names
            .iter()
            .map(|n| format!("#define {} ({}->{})", n, target, n))
            .collect();
        let undef = names.iter().map(|n| format!("#undef {}", n)).collect();
        (define, undef)
    }

    fn state_functions(&self, model: &SpecModel) -> Code {
        let global = &model.global;
        let state_param = format!("{} *state", STATE_STRUCT);
        let mut code = Code::new();

        code.add_line(banner("Copy the state"));
        code.append(&function(
            &format!(
                "void _cdsspec_copy({0} *{1}, {0} *{2})",
                STATE_STRUCT,
                naming::NEW_STATE_INST,
                naming::OLD_STATE_INST
            ),
            &global.copy_state,
        ));
        code.add_line("");

        let fields: Vec<String> = global
            .declared_state
            .iter()
            .map(|d| d.name.clone())
            .collect();
        let (define, undef) = self.field_macros(&fields, "state");
        code.add_line(banner("State field access"));
        code.append(&define);
        code.add_line("");

        let blocks = [
            ("initial", &global.init_state),
            ("clear", &global.clear_state),
            ("final", &global.final_state),
            ("print", &global.print_state),
        ];
        for (name, body) in blocks {
            code.add_line(banner(&format!("State function: {}", name)));
            code.append(&function(
                &format!("void _cdsspec_{}({})", name, state_param),
                body,
            ));
            code.add_line("");
        }

        for (idx, rule) in global.commutativity_rules.iter().enumerate() {
            code.append(&self.commutativity_checker(idx, rule));
            code.add_line("");
        }

        for interface in model.interfaces() {
            code.append(&self.interface_functions(interface));
        }

        code.append(&undef);
        code
    }

    fn commutativity_checker(&self, idx: usize, rule: &CommutativityRule) -> Code {
        let mut body = Code::new();
        body.add_line(format!(
            "{0} *M1 = ({0} *) _M1->value;",
            naming::struct_name(&rule.method1)
        ));
        body.add_line(format!(
            "{0} *M2 = ({0} *) _M2->value;",
            naming::struct_name(&rule.method2)
        ));
        body.add_line(format!("return {};", rule.condition));

        let mut code = Code::new();
        code.add_line(banner(&format!("Commutativity rule: {}", rule)));
        code.append(&function(
            &format!(
                "bool _cdsspec_commute_{}({} _M1, {} _M2)",
                idx, METHOD, METHOD
            ),
            &body,
        ));
        code
    }

    fn interface_functions(&self, interface: &InterfaceConstruct) -> Code {
        let header = &interface.header;
        let mut values: Vec<String> = header.args.iter().map(|a| a.name.clone()).collect();
        if !header.is_return_void() {
            values.push(C_RET.to_string());
        }
        let (define, undef) = self.field_macros(&values, "value");
        let fetch = format!(
            "{0} *value = ({0} *) {1}->value;",
            interface.struct_name, METHOD_INST
        );

        let mut code = Code::new();
        code.add_line(banner(&format!("Interface {}", interface.label)));
        code.append(&define);

        let conditions = [
            ("pre_condition", &interface.pre_condition),
            ("justifying_precondition", &interface.justifying_precondition),
            ("justifying_postcondition", &interface.justifying_postcondition),
            ("post_condition", &interface.post_condition),
        ];
        for (suffix, block) in conditions {
            if block.is_empty() {
                continue;
            }
            let mut body = Code::new();
            body.add_line(fetch.clone());
            body.append(block);
            code.append(&function(
                &format!(
                    "bool {}({} {}, {} *state)",
                    interface_function(&interface.label, suffix),
                    METHOD,
                    METHOD_INST,
                    STATE_STRUCT
                ),
                &body,
            ));
        }

        if !interface.transition.is_empty() {
            let mut body = Code::new();
            body.add_line(fetch.clone());
            body.append(&interface.transition);
            code.append(&function(
                &format!(
                    "void {}({} {}, {} *state)",
                    interface_function(&interface.label, "transition"),
                    METHOD,
                    METHOD_INST,
                    STATE_STRUCT
                ),
                &body,
            ));
        }

        let mut body = Code::new();
        body.add_line(fetch);
        body.append(&interface.print);
        code.append(&function(
            &format!(
                "void {}({} {})",
                interface_function(&interface.label, "print_value"),
                METHOD,
                METHOD_INST
            ),
            &body,
        ));

        code.append(&undef);
        code.add_line("");
        code
    }

    fn init_annotation(&self, model: &SpecModel) -> Code {
        let global = &model.global;
        let mut body = Code::new();

        body.add_line("/* State functions */");
        body.add_line(
            "StateFunctions *stateFuncs = new StateFunctions((void *) _cdsspec_initial, (void *) _cdsspec_copy, (void *) _cdsspec_clear, (void *) _cdsspec_final, (void *) _cdsspec_print);",
        );

        body.add_line("/* Commutativity rules */");
        let rule_count = global.commutativity_rules.len();
        body.add_line(format!("int commuteRuleNum = {};", rule_count));
        if rule_count == 0 {
            body.add_line("CommutativityRule *commuteRules = NULL;");
        } else {
            body.add_line(format!(
                "CommutativityRule *commuteRules = new CommutativityRule[{}];",
                rule_count
            ));
            for (idx, rule) in global.commutativity_rules.iter().enumerate() {
                body.add_line(format!(
                    "commuteRules[{}] = CommutativityRule({}, {}, {}, (void *) _cdsspec_commute_{});",
                    idx,
                    quoted(&rule.method1),
                    quoted(&rule.method2),
                    quoted(&rule.condition),
                    idx
                ));
            }
        }

        body.add_line("/* Interface functions */");
        let interfaces: Vec<&InterfaceConstruct> = model.interfaces().collect();
        body.add_line(format!("int interfaceNum = {};", interfaces.len()));
        body.add_line("NamedFunction *interfaceFuncs = new NamedFunction[interfaceNum * 6];");
        for (idx, interface) in interfaces.iter().enumerate() {
            let slot = |present: bool, suffix: &str| {
                if present {
                    format!("(void *) {}", interface_function(&interface.label, suffix))
                } else {
                    "NULL".to_string()
                }
            };
            let entries = [
                slot(!interface.transition.is_empty(), "transition"),
                slot(!interface.pre_condition.is_empty(), "pre_condition"),
                slot(
                    !interface.justifying_precondition.is_empty(),
                    "justifying_precondition",
                ),
                slot(
                    !interface.justifying_postcondition.is_empty(),
                    "justifying_postcondition",
                ),
                slot(!interface.post_condition.is_empty(), "post_condition"),
                slot(true, "print_value"),
            ];
            for (offset, entry) in entries.iter().enumerate() {
                body.add_line(format!(
                    "interfaceFuncs[{}] = NamedFunction({}, {});",
                    idx * 6 + offset,
                    quoted(&interface.label),
                    entry
                ));
            }
        }

        body.add_line("/* Pass the information to the checker */");
        body.add_line(
            "CDSSpecInitInfo *initInfo = new CDSSpecInitInfo(stateFuncs, commuteRuleNum, commuteRules, interfaceNum, interfaceFuncs);",
        );
        body.add_line("cdsannotate(SPEC_ANALYSIS, new SpecAnnotation(INIT, initInfo));");

        function(&format!("void {}()", INIT_FUNCTION), &body)
    }
}

impl Renderer for CdsSpecRenderer {
    fn render_op(&self, op: &OpConstruct) -> Code {
        let call = if op.kind.requires_label() {
            let label = op.label.as_deref().unwrap_or_default();
            format!("{}({});", op_function(op.kind), quoted(label))
        } else {
            format!("{}();", op_function(op.kind))
        };

        let mut code = Code::new();
        code.add_line(banner(&format!("Ordering point @{}", op.kind.tag())));
        if op.condition == "true" {
            code.add_line(call);
        } else {
            code.add_line(format!("if ({})", op.condition));
            code.add_line(format!("\t{}", call));
        }
        code
    }

    fn render_entry(&self, _entry: &EntryConstruct) -> Code {
        let mut code = Code::new();
        code.add_line(banner("Specification initialization"));
        code.add_line(format!("{}();", INIT_FUNCTION));
        code
    }

    fn render_define(&self, define: &DefineConstruct) -> Code {
        let mut code = Code::new();
        code.add_line(banner("User-defined code"));
        code.append(&define.code);
        code.add_line(banner("End of user-defined code"));
        code
    }

    fn render_interface_wrapper(&self, interface: &InterfaceConstruct) -> Code {
        let header = &interface.header;
        let mut body = Code::new();
        body.add_line("// Interface begins");
        body.add_line(format!(
            "AnnoInterfaceInfo *info = {}({});",
            INTERFACE_BEGIN_FUNCTION,
            quoted(&interface.label)
        ));
        body.add_line(format!("{};", header.renamed_call()));
        body.add_line(format!(
            "{0} *value = new {0};",
            interface.struct_name
        ));
        body.add_line("info->value = value;");
        if !header.is_return_void() {
            body.add_line(format!("value->{0} = {0};", C_RET));
        }
        for arg in &header.args {
            body.add_line(format!("value->{0} = {0};", arg.name));
        }
        if !header.is_return_void() {
            body.add_line(format!("return {};", C_RET));
        }

        let mut code = Code::new();
        code.add_line(banner(&format!("Interface wrapper of {}", interface.label)));
        code.append(&function(&header.declaration(), &body));
        code
    }

    fn render_header_file(&self, model: &SpecModel) -> Code {
        let mut code = Code::new();
        code.add_line(banner(&format!("{} (generated, do not edit)", GENERATED_HEADER)));
        code.add_line(format!("#ifndef {}", HEADER_GUARD));
        code.add_line(format!("#define {}", HEADER_GUARD));
        code.add_line("");

        for header in naming::PRE_INCLUDED_HEADERS {
            if header != format!("\"{}\"", GENERATED_HEADER) {
                code.add_line(include(header));
            }
        }
        code.add_line("");

        if !model.headers.is_empty() {
            code.add_line(banner("User headers"));
            code.add_lines(model.headers.iter().map(|h| include(h)));
            code.add_line("");
        }

        if !model.forward_classes.is_empty() {
            code.add_line(banner("Forward declarations"));
            code.add_lines(model.forward_classes.iter().map(|c| format!("struct {};", c)));
            code.add_line("");
        }

        code.add_line(banner("The abstract state"));
        code.append(&self.state_struct(model));
        code.add_line("");

        for interface in model.interfaces() {
            code.add_line(banner(&format!("Value struct of interface {}", interface.label)));
            code.append(&self.value_struct(interface));
            code.add_line("");
        }

        code.add_line(format!("void {}();", INIT_FUNCTION));
        code.add_line("");
        code.add_line(format!("#endif /* {} */", HEADER_GUARD));
        code
    }

    fn render_companion_source(&self, model: &SpecModel) -> Code {
        let mut code = Code::new();
        code.add_line(banner(&format!("{} (generated, do not edit)", naming::GENERATED_SOURCE)));
        code.add_line(include(&format!("\"{}\"", GENERATED_HEADER)));
        code.add_line("");
        code.append(&self.state_functions(model));
        code.add_line("");
        code.add_line(banner("Specification initialization"));
        code.append(&self.init_annotation(model));
        code
    }
}
