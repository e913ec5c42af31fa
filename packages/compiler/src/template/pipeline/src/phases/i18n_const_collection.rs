//! Lifts i18n messages into the consts array. Each root message becomes an `i18n_N` variable
//! initialized through `$localize`, and i18n ops record the index of their root message's const.
//! Attribute messages become the value of their extracted attribute, or an entry of the config
//! read by `i18nAttributes`.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::constant_pool::ConstantPool;
use crate::error::{PipelineError, Result};
use crate::i18n::i18n_ast::Message;
use crate::output::output_ast::{
    self as o, Expression, LiteralMapEntry, Statement, StmtModifier,
};
use crate::render3::r3_identifiers::Identifiers;
use crate::template::pipeline::ir::ops::I18nMessageOp;
use crate::template::pipeline::ir::{ConstIndex, CreateOp, I18nExpressionFor, UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

/// Prefix of the variables holding translated messages.
const TRANSLATION_VAR_PREFIX: &str = "i18n_";

/// The runtime tag used to translate messages.
const LOCALIZE: &str = "$localize";

/// Prefix of the placeholder standing in for several ICU sub-messages sharing one name.
const I18N_ICU_MAPPING_PREFIX: &str = "I18N_EXP_";

const ESCAPE: char = '\u{FFFD}';

pub fn collect_i18n_consts(job: &mut ComponentCompilationJob) -> Result<()> {
    // Messages are only needed here; pull them out of the create lists.
    let mut messages: IndexMap<XrefId, I18nMessageOp> = IndexMap::new();
    // Element xref to the attribute expressions applied through its `I18nAttributes` op.
    let mut attribute_expressions: HashMap<XrefId, Vec<(String, XrefId)>> = HashMap::new();
    for unit in job.views.values_mut() {
        for id in unit.create.ids() {
            if !matches!(unit.create.get(id)?, CreateOp::I18nMessage(_)) {
                continue;
            }
            if let CreateOp::I18nMessage(message) = unit.create.remove(id)? {
                messages.insert(message.xref, message);
            }
        }
        for op in unit.update.iter() {
            if let UpdateOp::I18nExpression(expr) = op {
                if expr.usage == I18nExpressionFor::I18nAttribute {
                    attribute_expressions
                        .entry(expr.target)
                        .or_default()
                        .push((expr.name.clone(), expr.context));
                }
            }
        }
    }

    let mut block_consts: HashMap<XrefId, ConstIndex> = HashMap::new();
    // Attribute context xref to the variable holding its translated message.
    let mut attribute_values: HashMap<XrefId, Expression> = HashMap::new();
    for message in messages.values() {
        // Sub-messages are declared together with their root message.
        if message.message_placeholder.is_some() {
            continue;
        }
        let (main_var, statements) = collect_message(&mut job.base.pool, &messages, message)?;
        match message.i18n_block {
            Some(block) => {
                let index = job.add_const(main_var, statements);
                block_consts.insert(block, index);
            }
            None => {
                // Attribute messages are read through their variable, not a const index.
                job.consts_initializers.extend(statements);
                attribute_values.insert(message.i18n_context, main_var);
            }
        }
    }

    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            let CreateOp::ExtractedAttribute(attr) = op else {
                continue;
            };
            if let Some(value) = attr.i18n_context.and_then(|c| attribute_values.get(&c)) {
                attr.expression = Some(value.clone());
            }
        }
    }

    collect_attribute_configs(job, &attribute_expressions, &attribute_values)?;

    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            let (CreateOp::I18nStart(op) | CreateOp::I18n(op)) = op else {
                continue;
            };
            let index = block_consts.get(&op.root).ok_or_else(|| {
                PipelineError::assertion(
                    "could not find the const index of the root message of an i18n block",
                )
            })?;
            op.message_index = Some(*index);
        }
    }
    Ok(())
}

/// Each `I18nAttributes` op reads a const array alternating attribute names and the variables of
/// their messages. An attribute bound several times appears once.
fn collect_attribute_configs(
    job: &mut ComponentCompilationJob,
    attribute_expressions: &HashMap<XrefId, Vec<(String, XrefId)>>,
    attribute_values: &HashMap<XrefId, Expression>,
) -> Result<()> {
    let mut configs: Vec<(XrefId, Expression)> = Vec::new();
    for unit in job.views.values() {
        for op in unit.create.iter() {
            let CreateOp::I18nAttributes(op) = op else {
                continue;
            };
            let expressions = attribute_expressions
                .get(&op.target)
                .filter(|exprs| !exprs.is_empty())
                .ok_or_else(|| {
                    PipelineError::assertion(
                        "could not find any i18n expressions associated with an I18nAttributes op",
                    )
                })?;
            let mut seen = HashSet::new();
            let mut entries = Vec::new();
            for (name, context) in expressions {
                if !seen.insert(name) {
                    continue;
                }
                let value = attribute_values.get(context).ok_or_else(|| {
                    PipelineError::assertion("could not find the value of an i18n expression")
                })?;
                entries.push(o::literal(name.as_str()));
                entries.push(value.clone());
            }
            configs.push((op.xref, o::literal_arr(entries)));
        }
    }

    let indices: HashMap<XrefId, ConstIndex> = configs
        .into_iter()
        .map(|(xref, config)| (xref, job.add_const(config, vec![])))
        .collect();
    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            if let CreateOp::I18nAttributes(op) = op {
                op.i18n_attributes_config = indices.get(&op.xref).copied();
            }
        }
    }
    Ok(())
}

/// Declares the variable of `message` after the variables of its sub-messages.
fn collect_message(
    pool: &mut ConstantPool,
    messages: &IndexMap<XrefId, I18nMessageOp>,
    message: &I18nMessageOp,
) -> Result<(Expression, Vec<Statement>)> {
    let mut statements = Vec::new();
    let mut sub_message_vars: IndexMap<String, Vec<Expression>> = IndexMap::new();
    for sub in &message.sub_messages {
        let sub_message = messages.get(sub).ok_or_else(|| {
            PipelineError::assertion("i18n sub-message is missing from the job")
        })?;
        let placeholder = sub_message.message_placeholder.clone().ok_or_else(|| {
            PipelineError::assertion("i18n sub-message should have a placeholder")
        })?;
        let (sub_var, sub_statements) = collect_message(pool, messages, sub_message)?;
        statements.extend(sub_statements);
        sub_message_vars.entry(placeholder).or_default().push(sub_var);
    }

    let mut params = message.params.clone();
    let mut postprocessing_params = message.postprocessing_params.clone();
    for (placeholder, mut vars) in sub_message_vars {
        if vars.len() == 1 {
            params.insert(placeholder, vars.remove(0));
        } else {
            // Several ICUs under one name are picked at runtime during post-processing.
            params.insert(
                placeholder.clone(),
                o::literal(format!("{ESCAPE}{I18N_ICU_MAPPING_PREFIX}{placeholder}{ESCAPE}")),
            );
            postprocessing_params.insert(placeholder, o::literal_arr(vars));
        }
    }
    params.sort_keys();
    postprocessing_params.sort_keys();

    let main_var = o::variable(pool.unique_name(TRANSLATION_VAR_PREFIX, true));
    statements.push(declare_i18n_variable(&main_var)?);
    statements.push(
        main_var
            .clone()
            .set(localize_call(&message.message, &params))
            .to_stmt(),
    );
    if message.needs_postprocessing || !postprocessing_params.is_empty() {
        let mut args = vec![main_var.clone()];
        if !postprocessing_params.is_empty() {
            args.push(params_map(&postprocessing_params));
        }
        let postprocess = o::import_ref(Identifiers::i18n_postprocess()).call_fn(args);
        statements.push(main_var.clone().set(postprocess).to_stmt());
    }
    Ok((main_var, statements))
}

fn declare_i18n_variable(variable: &Expression) -> Result<Statement> {
    match variable {
        Expression::ReadVar(read) => Ok(o::declare_var(&read.name, None, StmtModifier::NONE)),
        _ => Err(PipelineError::assertion("i18n message variable should be a variable read")),
    }
}

fn localize_call(message: &Message, params: &IndexMap<String, Expression>) -> Expression {
    let meta = serialize_message_meta(message);
    let text = if meta.is_empty() {
        message.message_string.clone()
    } else {
        format!(":{meta}:{}", message.message_string)
    };
    o::variable(LOCALIZE).call_fn(vec![o::literal(text), params_map(params)])
}

/// `meaning|description@@customId`, empty when the message carries no metadata.
fn serialize_message_meta(message: &Message) -> String {
    let mut meta = message.description.clone();
    if !message.meaning.is_empty() {
        meta = format!("{}|{meta}", message.meaning);
    }
    if !message.custom_id.is_empty() {
        meta = format!("{meta}@@{}", message.custom_id);
    }
    meta
}

fn params_map(params: &IndexMap<String, Expression>) -> Expression {
    o::literal_map(
        params
            .iter()
            .map(|(name, value)| LiteralMapEntry {
                key: to_public_name(name),
                value: Box::new(value.clone()),
                quoted: true,
            })
            .collect(),
    )
}

/// Placeholder names as they appear in the runtime message.
fn to_public_name(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::template::pipeline::ir::ops::{
        create_extracted_attribute_op, create_i18n_attributes_op, create_i18n_end_op,
        create_i18n_start_op, I18nExpressionOp,
    };
    use crate::template::pipeline::ir::{BindingKind, I18nParamResolutionTime, SlotHandle};

    fn message_op(
        xref: XrefId,
        block: Option<XrefId>,
        placeholder: Option<&str>,
        sub_messages: Vec<XrefId>,
    ) -> CreateOp {
        CreateOp::I18nMessage(I18nMessageOp {
            xref,
            i18n_context: XrefId(900),
            i18n_block: block,
            message: Message::new("{$INTERPOLATION}", "m"),
            message_placeholder: placeholder.map(str::to_string),
            params: IndexMap::from([("INTERPOLATION".to_string(), o::literal("\u{FFFD}0\u{FFFD}"))]),
            postprocessing_params: IndexMap::new(),
            needs_postprocessing: false,
            sub_messages,
        })
    }

    fn message_index(job: &ComponentCompilationJob) -> Option<ConstIndex> {
        job.views[&job.root].create.iter().find_map(|op| match op {
            CreateOp::I18nStart(op) => op.message_index,
            _ => None,
        })
    }

    #[test]
    fn test_root_message_becomes_const() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let block = job.base.allocate_xref_id();
        let message = job.base.allocate_xref_id();
        let root = job.root;
        let unit = &mut job.views[&root];
        unit.create
            .push(create_i18n_start_op(block, Message::new("m", "m"), None));
        unit.create.push(create_i18n_end_op(block));
        unit.create.push(message_op(message, Some(block), None, vec![]));

        collect_i18n_consts(&mut job).unwrap();

        assert_eq!(message_index(&job), Some(ConstIndex(0)));
        assert!(job.consts[0].is_equivalent(&o::variable("i18n_0")));
        assert_eq!(job.consts_initializers.len(), 2);
        assert_eq!(job.views[&root].create.len(), 2);
    }

    #[test]
    fn test_sub_messages_are_declared_first() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let block = job.base.allocate_xref_id();
        let main = job.base.allocate_xref_id();
        let sub = job.base.allocate_xref_id();
        let root = job.root;
        let unit = &mut job.views[&root];
        unit.create
            .push(create_i18n_start_op(block, Message::new("m", "m"), None));
        unit.create.push(create_i18n_end_op(block));
        unit.create.push(message_op(main, Some(block), None, vec![sub]));
        unit.create.push(message_op(sub, Some(block), Some("ICU"), vec![]));

        collect_i18n_consts(&mut job).unwrap();

        assert_eq!(job.consts.len(), 1);
        assert!(job.consts[0].is_equivalent(&o::variable("i18n_1")));
        match &job.consts_initializers[0] {
            Statement::DeclareVar(decl) => assert_eq!(decl.name, "i18n_0"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_attribute_message_becomes_extracted_attribute_value() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let div = job.base.allocate_xref_id();
        let context = job.base.allocate_xref_id();
        let message = job.base.allocate_xref_id();
        let root = job.root;
        let mut attr = create_extracted_attribute_op(
            div,
            BindingKind::I18n,
            None,
            "title",
            None,
            vec![],
        );
        attr.i18n_context = Some(context);
        let mut message = message_op(message, None, None, vec![]);
        if let CreateOp::I18nMessage(op) = &mut message {
            op.i18n_context = context;
        }
        let unit = &mut job.views[&root];
        unit.create.push(CreateOp::ExtractedAttribute(attr));
        unit.create.push(message);

        collect_i18n_consts(&mut job).unwrap();

        assert!(job.consts.is_empty());
        assert_eq!(job.consts_initializers.len(), 2);
        match job.views[&root].create.iter().next() {
            Some(CreateOp::ExtractedAttribute(attr)) => assert!(attr
                .expression
                .as_ref()
                .is_some_and(|e| e.is_equivalent(&o::variable("i18n_0")))),
            other => panic!("unexpected {other:?}"),
        };
    }

    #[test]
    fn test_i18n_attributes_config_lists_each_attribute_once() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let div = job.base.allocate_xref_id();
        let attrs = job.base.allocate_xref_id();
        let context = job.base.allocate_xref_id();
        let message = job.base.allocate_xref_id();
        let root = job.root;
        let mut message = message_op(message, None, None, vec![]);
        if let CreateOp::I18nMessage(op) = &mut message {
            op.i18n_context = context;
        }
        let expression = |placeholder: &str| {
            UpdateOp::I18nExpression(I18nExpressionOp {
                context,
                target: div,
                i18n_owner: attrs,
                handle: SlotHandle::new(),
                expression: o::variable("name"),
                icu_placeholder: None,
                i18n_placeholder: Some(placeholder.to_string()),
                resolution_time: I18nParamResolutionTime::Creation,
                usage: I18nExpressionFor::I18nAttribute,
                name: "title".into(),
            })
        };
        let unit = &mut job.views[&root];
        unit.create
            .push(create_i18n_attributes_op(attrs, SlotHandle::new(), div));
        unit.create.push(message);
        unit.update.push(expression("INTERPOLATION"));
        unit.update.push(expression("INTERPOLATION_1"));

        collect_i18n_consts(&mut job).unwrap();

        let config = job.views[&root].create.iter().find_map(|op| match op {
            CreateOp::I18nAttributes(op) => op.i18n_attributes_config,
            _ => None,
        });
        assert_eq!(config, Some(ConstIndex(0)));
        let expected = o::literal_arr(vec![o::literal("title"), o::variable("i18n_0")]);
        assert!(job.consts[0].is_equivalent(&expected));
    }

    #[test]
    fn test_i18n_attributes_without_expressions_is_an_error() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let div = job.base.allocate_xref_id();
        let attrs = job.base.allocate_xref_id();
        let root = job.root;
        job.views[&root]
            .create
            .push(create_i18n_attributes_op(attrs, SlotHandle::new(), div));

        assert!(matches!(
            collect_i18n_consts(&mut job),
            Err(PipelineError::Assertion(_))
        ));
    }

    #[test]
    fn test_public_names() {
        assert_eq!(to_public_name("start_tag-div"), "START_TAG_DIV");
    }
}
