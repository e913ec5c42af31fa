//! Generate Projection Defs
//!
//! Locate projection slots, populate the component's `ngContentSelectors` literal field, assign
//! the `projection` slot indices and generate the `projectionDef` instruction for the job's root
//! view.

use crate::core::{parse_selector_to_r3_selector, R3SelectorPart};
use crate::error::Result;
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::ops::create_projection_def_op;
use crate::template::pipeline::ir::CreateOp;
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

const WILDCARD_SELECTOR: &str = "*";

pub fn generate_projection_defs(job: &mut ComponentCompilationJob) -> Result<()> {
    // TemplateDefinitionBuilder always shares the selector constants.
    let share = job.base.is_compat();

    // Collect all selectors from this component and its nested views. Each projection gets a
    // unique ascending projection slot index.
    let mut selectors: Vec<String> = Vec::new();
    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            if let CreateOp::Projection(projection) = op {
                projection.projection_slot_index = selectors.len();
                selectors.push(projection.selector.clone());
            }
        }
    }
    if selectors.is_empty() {
        return Ok(());
    }

    // A single wildcard selector uses the default behavior, with no arguments.
    let def = if selectors.len() > 1 || selectors[0] != WILDCARD_SELECTOR {
        let def = o::literal_arr(selectors.iter().map(|s| selector_literal(s)).collect());
        Some(job.base.pool.get_const_literal(def, share))
    } else {
        None
    };

    let content_selectors =
        o::literal_arr(selectors.iter().map(|s| o::literal(s.as_str())).collect());
    job.content_selectors = Some(job.base.pool.get_const_literal(content_selectors, share));

    // The projection def instruction goes at the beginning of the root view, before any
    // `projection` instructions.
    if let Some(def) = def {
        job.root_view_mut()?
            .create
            .prepend(vec![create_projection_def_op(Some(def))]);
    }
    Ok(())
}

fn selector_literal(selector: &str) -> Expression {
    if selector == WILDCARD_SELECTOR {
        return o::literal(selector);
    }
    o::literal_arr(
        parse_selector_to_r3_selector(selector)
            .into_iter()
            .map(|parts| {
                o::literal_arr(
                    parts
                        .into_iter()
                        .map(|part| match part {
                            R3SelectorPart::Str(s) => o::literal(s),
                            R3SelectorPart::Flag(flag) => o::literal(f64::from(flag)),
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}
