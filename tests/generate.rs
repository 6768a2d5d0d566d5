use cdsspec_compiler::{CodeGenerator, Error};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const STACK_HEADER: &str = "#ifndef STACK_H
#define STACK_H
#include <stdatomic.h>
#include \"node.h\"

/** @DeclareState: IntList *stack;
    @Commutativity: Push <-> Pop (M2->RET == -1) */

/** @Define:
    #define EMPTY -1
*/

/** @Interface: Push
    @Transition: STATE(stack)->push_back(val); */
void push(stack_t *s, int val);

#endif
";

const STACK_SOURCE: &str = "#include \"stack.h\"

/** @Interface: Push
    @Transition: stack->push_back(val); */
void push(stack_t *s, int val) {
    node_t *n = new_node(val);
    s->top = n;
    /** @OPDefine: true */
}

/** @Interface: Pop
    @PreCondition: return true;
    @Transition: if (!stack->empty()) stack->pop_back(); */
int pop(stack_t *s) {
    node_t *n = s->top;
    /** @PotentialOP(PopRead): n == NULL */
    if (n == NULL)
        return -1;
    /** @OPCheck(PopRead): true */
    return n->val;
}

int main() {
    /** @Entry */
    return 0;
}
";

fn fixture(header: &str, source: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("stack.h"), header).unwrap();
    fs::write(input.join("stack.cc"), source).unwrap();
    fs::write(input.join("README"), "not a source file").unwrap();
    dir
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn test_generate_rewrites_sources_and_writes_aggregates() {
    // The prototype in the header is an interface too; give it a different label.
    let header = STACK_HEADER.replace("@Interface: Push", "@Interface: PushDecl");
    let header = header.replace("void push(stack_t *s, int val);", "void push_all(stack_t *s) { }");
    let dir = fixture(&header, STACK_SOURCE);
    let out = dir.path().join("out");

    let report = CodeGenerator::new(dir.path().join("in"), &out)
        .generate()
        .unwrap();

    let names: Vec<String> = report
        .written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["cdsspec-generated.h", "cdsspec-generated.cc", "stack.cc", "stack.h"]
    );
    assert!(!out.join("README").exists());

    let source = read(&out, "stack.cc");
    let lines: Vec<&str> = source.lines().collect();
    assert_eq!(lines[0], "/* Add the cdsspec-generated.h header file */");
    assert_eq!(lines[1], "#include \"cdsspec-generated.h\"");
    assert_eq!(lines[2], "#include \"stack.h\"");
    assert!(source.contains("void __wrapper__push(stack_t *s, int val) {\n"));
    assert!(source.contains("int __wrapper__pop(stack_t *s) {\n"));
    assert!(source.contains("\tint RET = __wrapper__pop(s);\n"));
    assert!(source.contains("if (n == NULL)\n\t_createPotentialOPAnnotation(\"PopRead\");\n"));
    assert!(source.contains("    /** @Entry */\n/**********    Specification initialization    **********/\n_createInitAnnotation();\n    return 0;\n"));

    // Every original line other than the renamed declarations survives in order.
    let original_kept: Vec<&str> = STACK_SOURCE
        .lines()
        .filter(|l| !l.starts_with("void push(") && !l.starts_with("int pop("))
        .collect();
    let mut remaining = lines.iter();
    for line in original_kept {
        assert!(remaining.any(|l| *l == line), "missing line {:?}", line);
    }

    let header_out = read(&out, "stack.h");
    assert!(header_out.starts_with("#ifndef STACK_H\n"));
    assert!(header_out.contains("*/\n/**********    User-defined code    **********/\n#define EMPTY -1\n"));
    assert!(header_out.contains("void __wrapper__push_all(stack_t *s) { }\n"));

    let generated_header = read(&out, "cdsspec-generated.h");
    assert!(generated_header.contains("#include \"node.h\"\n"));
    assert!(generated_header.contains("#include \"stack.h\"\n"));
    assert!(!generated_header.contains("#include \"cdsspec-generated.h\""));
    assert!(generated_header.contains("struct stack_t;\n"));
    assert!(generated_header.contains("typedef struct __struct_Pop__ {\n\tint RET;\n\tstack_t * s;\n"));

    let companion = read(&out, "cdsspec-generated.cc");
    assert!(companion.contains("bool _Pop_pre_condition(Method _M, StateStruct *state) {\n"));
    assert!(companion.contains("\treturn M2->RET == -1;\n"));
    assert!(companion.contains("void _cdsspec_initial(StateStruct *state) {\n\tstack = new IntList();\n}"));
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_fatal_annotation_error_writes_nothing() {
    let source = STACK_SOURCE.replace("@OPCheck(PopRead): true", "@OPCheck: true");
    let header = STACK_HEADER.replace(
        "/** @Interface: Push\n    @Transition: STATE(stack)->push_back(val); */\nvoid push(stack_t *s, int val);\n",
        "",
    );
    let dir = fixture(&header, &source);
    let out = dir.path().join("out");

    let err = CodeGenerator::new(dir.path().join("in"), &out)
        .generate()
        .unwrap_err();

    assert!(err.is_annotation_error());
    assert!(err.to_string().starts_with("Spec error in file \"stack.cc\", line 19:"));
    assert!(!out.exists());
}

#[test]
fn test_interface_on_prototype_is_rejected() {
    let dir = fixture(STACK_HEADER, STACK_SOURCE);
    let err = CodeGenerator::new(dir.path().join("in"), dir.path().join("out"))
        .generate()
        .unwrap_err();

    assert!(matches!(err, Error::Annotation { .. }), "{}", err);
    assert!(err.to_string().contains("stack.h\", line 15"), "{}", err);
    assert!(err.to_string().contains("Unmatched braces"), "{}", err);
}

#[test]
fn test_duplicate_interface_label_across_files_is_rejected() {
    let header = STACK_HEADER.replace("void push(stack_t *s, int val);", "void push_all(stack_t *s) { }");
    let dir = fixture(&header, STACK_SOURCE);
    let err = CodeGenerator::new(dir.path().join("in"), dir.path().join("out"))
        .generate()
        .unwrap_err();

    assert!(err.to_string().contains("Multiple interfaces labelled \"Push\""), "{}", err);
}
