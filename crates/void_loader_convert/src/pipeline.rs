//! Loader conversion pipeline
//!
//! Builds the ordered rule set that turns a generator-produced loader into
//! one written against interop array types, and runs it over text or files.
//!
//! Stages run in [`Stage`] order. Rules are literal wherever the generator's
//! output is fixed text; patterns are used only where a capture is needed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ConvertError, Result};
use crate::rule::{RuleHit, RuleKind, RuleSet, RewriteRule, Stage};
use crate::tables::TypeTables;

/// Banner and imports placed at the top of every converted loader
pub const PREAMBLE: &str = "// Generated by FlatFileCodeGen + ModByteLoader\n\
using Il2CppInterop.Runtime;\n\
using Il2CppInterop.Runtime.InteropTypes;\n\
using Il2CppInterop.Runtime.InteropTypes.Arrays;\n\
using BTD_Mod_Helper.Extensions;\n\
using BTD_Mod_Helper.Api;\n\
using Il2Cpp;\n";

const TARGET_TYPE: &str = "Il2CppAssets.Scripts.Models.Towers.TargetType";

/// Call arguments with at most one level of nested calls, e.g. `br.ReadInt32()`
const CALL_ARGS: &str = r"((?:[^()]|\([^()]*\))*)";

/// (generator array type, keyword, interop array)
fn primitive_arrays(tables: &TypeTables) -> [(&'static str, &'static str, String); 3] {
    [
        ("System.String", "string", tables.string_array.clone()),
        ("System.Single", "float", tables.struct_array_of("float")),
        ("System.Int32", "int", tables.struct_array_of("int")),
    ]
}

/// What a converted loader is called and what it loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderTarget {
    /// Fully qualified payload type, e.g. `Il2CppAssets.Scripts.Models.GameModel`
    pub payload_type: String,
    /// Name of the generated class
    pub class_name: String,
    /// Bytes resource the loader reads
    pub bytes_file_name: String,
    /// Optional file-scoped namespace
    pub namespace: Option<String>,
}

impl LoaderTarget {
    pub fn new(
        payload_type: impl Into<String>,
        class_name: impl Into<String>,
        bytes_file_name: impl Into<String>,
    ) -> Self {
        Self {
            payload_type: payload_type.into(),
            class_name: class_name.into(),
            bytes_file_name: bytes_file_name.into(),
            namespace: None,
        }
    }

    /// Place the converted loader in a namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Payload type without its namespace
    pub fn short_name(&self) -> &str {
        self.payload_type
            .rsplit('.')
            .next()
            .unwrap_or(&self.payload_type)
    }

    /// Reject targets with empty required fields
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("payload_type", &self.payload_type),
            ("class_name", &self.class_name),
            ("bytes_file_name", &self.bytes_file_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConvertError::MissingField(field.to_string()));
            }
        }
        Ok(())
    }
}

/// Escape `$` so a name is inserted verbatim into a pattern replacement
fn verbatim(text: &str) -> String {
    text.replace('$', "$$")
}

fn header_rules(target: &LoaderTarget) -> Vec<RewriteRule> {
    let mut header = PREAMBLE.to_string();
    if let Some(namespace) = target.namespace.as_deref().filter(|ns| !ns.is_empty()) {
        header.push_str(&format!("\nnamespace {};\n", namespace));
    }

    vec![RewriteRule::prepend(Stage::Header, "preamble", header)]
}

fn class_signature_rules(target: &LoaderTarget, tables: &TypeTables) -> Vec<RewriteRule> {
    vec![
        RewriteRule::literal(
            Stage::ClassSignature,
            "class_signature",
            format!("{}Loader : {}", target.short_name(), tables.generator_interface),
            format!(
                "{} : {}<{}>",
                target.class_name, tables.base_loader, target.payload_type
            ),
        ),
        RewriteRule::literal(
            Stage::ClassSignature,
            "public_members",
            "\tpublic",
            "\tprotected override",
        ),
        RewriteRule::literal(
            Stage::ClassSignature,
            "object_table_field",
            "object[] m;",
            format!(
                "protected override string BytesFileName => \"{}\";",
                target.bytes_file_name
            ),
        ),
    ]
}

fn namespace_rules() -> Result<Vec<RewriteRule>> {
    Ok(vec![
        RewriteRule::pattern(Stage::Namespaces, "assets_root", r"\bAssets\b", "Il2CppAssets")?,
        RewriteRule::literal(
            Stage::Namespaces,
            "system_usings",
            "using System",
            "using Il2CppSystem",
        ),
        RewriteRule::literal(
            Stage::Namespaces,
            "system_io",
            "using Il2CppSystem.IO",
            "using System.IO",
        )
        .after("system_usings also catches System.IO, which has no interop counterpart"),
    ])
}

fn generic_constraint_rules(tables: &TypeTables) -> Result<Vec<RewriteRule>> {
    Ok(vec![RewriteRule::pattern(
        Stage::GenericConstraints,
        "generic_reader_constraint",
        r"private void (\w+)<T>\(\) \{",
        format!(
            "private void ${{1}}<T>() where T : {} {{",
            verbatim(&tables.object_base)
        ),
    )?])
}

fn literal_construct_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::literal(
            Stage::LiteralConstructs,
            "samples_field",
            "samplesField.SetValue(v,(System.Single[]) m[br.ReadInt32()]);",
            "v.samples = (System.Single[]) m[br.ReadInt32()];",
        )
        .after("matches the System.Single[] cast before array types are rewritten"),
        RewriteRule::literal(
            Stage::LiteralConstructs,
            "target_type_element",
            format!(
                "arr[j] = new {}(br.ReadString(), br.ReadBoolean())",
                TARGET_TYPE
            ),
            format!(
                "arr[j] = new {} {{id = br.ReadString(), isActionable = br.ReadBoolean()}}",
                TARGET_TYPE
            ),
        ),
        RewriteRule::literal(
            Stage::LiteralConstructs,
            "target_type_field",
            format!(
                "v.targetType = new {}(br.ReadString(), br.ReadBoolean());",
                TARGET_TYPE
            ),
            "v.targetType.id = br.ReadString();\n\t\t\tv.targetType.actionOnCreate = br.ReadBoolean();",
        ),
    ]
}

fn array_type_rules(tables: &TypeTables) -> Result<Vec<RewriteRule>> {
    let generic = tables.reference_array_of("T");
    let mut rules = vec![
        RewriteRule::pattern(Stage::ArrayTypes, "generic_array", r"\bT\[\]", verbatim(&generic))?,
        RewriteRule::literal(
            Stage::ArrayTypes,
            "generic_array_new",
            "new T[br.ReadInt32()]",
            format!("new {}(br.ReadInt32())", generic),
        ),
    ];

    for (qualified, keyword, interop) in primitive_arrays(tables) {
        rules.push(
            RewriteRule::literal(
                Stage::ArrayTypes,
                format!("{}_array", keyword),
                format!("{}[]", qualified),
                interop.clone(),
            )
            .with_kind(RuleKind::PerName),
        );
        rules.push(
            RewriteRule::literal(
                Stage::ArrayTypes,
                format!("{}_array_new", keyword),
                format!("new {}[arrCount]", keyword),
                format!("new {}(arrCount)", interop),
            )
            .with_kind(RuleKind::PerName),
        );
    }

    Ok(rules)
}

fn cast_rules() -> Result<Vec<RewriteRule>> {
    Ok(vec![
        RewriteRule::literal(
            Stage::Casts,
            "uninitialized_cast",
            "(T)FormatterServices.GetUninitializedObject(t)",
            "FormatterServices.GetUninitializedObject(t).Cast<T>()",
        ),
        RewriteRule::pattern(
            Stage::Casts,
            "typeof",
            r"typeof\(([A-Z][^()]*)\)",
            "Il2CppType.Of<${1}>()",
        )?,
    ])
}

fn domain_array_rules(tables: &TypeTables) -> Vec<RewriteRule> {
    let references = tables
        .references
        .iter()
        .map(|name| (name, tables.reference_array_of(name)));
    let structs = tables
        .structs
        .iter()
        .map(|name| (name, tables.struct_array_of(name)));

    references
        .chain(structs)
        .flat_map(|(name, interop)| {
            [
                RewriteRule::literal(
                    Stage::DomainArrays,
                    format!("domain_array_new:{}", name),
                    format!("{}[arrCount]", name),
                    format!("{}(arrCount)", interop),
                )
                .with_kind(RuleKind::PerName),
                RewriteRule::literal(
                    Stage::DomainArrays,
                    format!("domain_array:{}", name),
                    format!("{}[]", name),
                    interop,
                )
                .with_kind(RuleKind::PerName),
            ]
        })
        .collect()
}

/// Revert reference arrays of enum element types to native arrays
fn enum_array_rules(
    stage: Stage,
    prefix: &str,
    reason: &'static str,
    tables: &TypeTables,
) -> Result<Vec<RewriteRule>> {
    let mut rules = Vec::with_capacity(tables.enums.len() * 2);

    for name in &tables.enums {
        let interop = tables.reference_array_of(name);
        rules.push(
            RewriteRule::pattern(
                stage,
                format!("{}_new:{}", prefix, name),
                &format!(r"{}\({}\)", regex::escape(&interop), CALL_ARGS),
                format!("{}[${{1}}]", verbatim(name)),
            )?
            .with_kind(RuleKind::PerName)
            .after(reason),
        );
        rules.push(
            RewriteRule::literal(stage, format!("{}:{}", prefix, name), interop, format!("{}[]", name))
                .with_kind(RuleKind::PerName)
                .after(reason),
        );
    }

    Ok(rules)
}

fn setter_argument_rules() -> Result<Vec<RewriteRule>> {
    Ok(vec![RewriteRule::pattern(
        Stage::SetterArguments,
        "setter_arguments",
        r"SetValue\(v,br\.Read(Int32|Single|Boolean)\(\)\)",
        "SetValue(v,br.Read${1}().ToIl2Cpp())",
    )?
    .with_kind(RuleKind::Enumerated)])
}

fn cast_sweep_rules(tables: &TypeTables) -> Result<Vec<RewriteRule>> {
    let mut rules = vec![RewriteRule::pattern(
        Stage::CastSweep,
        "array_cast_sweep",
        r"\(([A-Z][\w.]*(?:<[^()]*>)?(?:\[\])*)\[\]\)",
        format!("({}<${{1}}>)", verbatim(&tables.reference_array)),
    )?];

    rules.extend(enum_array_rules(
        Stage::CastSweep,
        "enum_array_recheck",
        "array_cast_sweep wraps enum casts too",
        tables,
    )?);

    Ok(rules)
}

fn asset_reference_rules(tables: &TypeTables) -> Result<Vec<RewriteRule>> {
    let mut rules = Vec::with_capacity(tables.asset_refs.len() * 2);

    for name in &tables.asset_refs {
        let path = tables.asset_ref_path(name);
        rules.push(
            RewriteRule::pattern(
                Stage::AssetReferences,
                format!("asset_factory:{}", name),
                &format!(r"new {}\((.+)\)", regex::escape(&path)),
                format!("{}{}(${{1}})", verbatim(&tables.asset_factory), verbatim(name)),
            )?
            .with_kind(RuleKind::PerName),
        );
        rules.push(
            RewriteRule::literal(
                Stage::AssetReferences,
                format!("asset_array_cast:{}", name),
                format!("({})", tables.reference_array_of(&path)),
                format!("({}[])", path),
            )
            .with_kind(RuleKind::PerName)
            .after("asset references are never interop arrays"),
        );
    }

    Ok(rules)
}

/// Build the complete ordered rule set for one loader
pub fn build_rules(target: &LoaderTarget, tables: &TypeTables) -> Result<RuleSet> {
    target.validate()?;

    let mut rules = RuleSet::new();
    rules.extend(header_rules(target))?;
    rules.extend(class_signature_rules(target, tables))?;
    rules.extend(namespace_rules()?)?;
    rules.extend(generic_constraint_rules(tables)?)?;
    rules.extend(literal_construct_rules())?;
    rules.extend(array_type_rules(tables)?)?;
    rules.extend(cast_rules()?)?;
    rules.extend(domain_array_rules(tables))?;
    rules.extend(enum_array_rules(
        Stage::EnumArrays,
        "enum_array",
        "array and domain rules wrap enum element types too",
        tables,
    )?)?;
    rules.extend(setter_argument_rules()?)?;
    rules.extend(cast_sweep_rules(tables)?)?;
    rules.extend(asset_reference_rules(tables)?)?;

    Ok(rules)
}

/// Convert generated loader source text
pub fn transform(source: &str, target: &LoaderTarget, tables: &TypeTables) -> Result<String> {
    Ok(build_rules(target, tables)?.apply(source))
}

/// Convert generated loader source text and report per-rule matches
pub fn transform_with_report(
    source: &str,
    target: &LoaderTarget,
    tables: &TypeTables,
) -> Result<(String, Vec<RuleHit>)> {
    Ok(build_rules(target, tables)?.apply_with_report(source))
}

/// Outcome of converting one file
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub class_name: String,
    pub rules: Vec<RuleHit>,
}

impl ConvertReport {
    /// Rules that matched nothing
    pub fn misses(&self) -> impl Iterator<Item = &RuleHit> {
        self.rules.iter().filter(|hit| hit.matches == 0)
    }
}

/// Read a generated loader, convert it, and replace the output file
pub fn convert_file(
    input: &Path,
    output: &Path,
    target: &LoaderTarget,
    tables: &TypeTables,
) -> Result<ConvertReport> {
    let source = fs::read_to_string(input).map_err(|e| ConvertError::io(input, e))?;
    let (converted, rules) = transform_with_report(&source, target, tables)?;
    fs::write(output, converted).map_err(|e| ConvertError::io(output, e))?;

    log::info!(
        "Converted {} into {} ({})",
        input.display(),
        output.display(),
        target.class_name
    );

    Ok(ConvertReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        class_name: target.class_name.clone(),
        rules,
    })
}
