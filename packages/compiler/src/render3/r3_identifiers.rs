//! Render3 Identifiers
//!
//! Runtime instruction symbols referenced by reified template and host-binding functions.

use crate::output::output_ast::ExternalReference;

pub const CORE: &str = "@angular/core";

/// Runtime identifiers used in generated code
pub struct Identifiers;

impl Identifiers {
    const fn make_ref(name: &'static str) -> ExternalReference {
        ExternalReference::new(CORE, name)
    }

    /* Namespaces */

    pub const fn namespace_html() -> ExternalReference {
        Self::make_ref("ɵɵnamespaceHTML")
    }

    pub const fn namespace_math_ml() -> ExternalReference {
        Self::make_ref("ɵɵnamespaceMathML")
    }

    pub const fn namespace_svg() -> ExternalReference {
        Self::make_ref("ɵɵnamespaceSVG")
    }

    /* Elements */

    pub const fn element() -> ExternalReference {
        Self::make_ref("ɵɵelement")
    }

    pub const fn element_start() -> ExternalReference {
        Self::make_ref("ɵɵelementStart")
    }

    pub const fn element_end() -> ExternalReference {
        Self::make_ref("ɵɵelementEnd")
    }

    pub const fn element_container() -> ExternalReference {
        Self::make_ref("ɵɵelementContainer")
    }

    pub const fn element_container_start() -> ExternalReference {
        Self::make_ref("ɵɵelementContainerStart")
    }

    pub const fn element_container_end() -> ExternalReference {
        Self::make_ref("ɵɵelementContainerEnd")
    }

    pub const fn dom_element() -> ExternalReference {
        Self::make_ref("ɵɵdomElement")
    }

    pub const fn dom_element_start() -> ExternalReference {
        Self::make_ref("ɵɵdomElementStart")
    }

    pub const fn dom_element_end() -> ExternalReference {
        Self::make_ref("ɵɵdomElementEnd")
    }

    pub const fn dom_element_container() -> ExternalReference {
        Self::make_ref("ɵɵdomElementContainer")
    }

    pub const fn dom_element_container_start() -> ExternalReference {
        Self::make_ref("ɵɵdomElementContainerStart")
    }

    pub const fn dom_element_container_end() -> ExternalReference {
        Self::make_ref("ɵɵdomElementContainerEnd")
    }

    pub const fn template_create() -> ExternalReference {
        Self::make_ref("ɵɵtemplate")
    }

    pub const fn dom_template() -> ExternalReference {
        Self::make_ref("ɵɵdomTemplate")
    }

    pub const fn template_ref_extractor() -> ExternalReference {
        Self::make_ref("ɵɵtemplateRefExtractor")
    }

    pub const fn text() -> ExternalReference {
        Self::make_ref("ɵɵtext")
    }

    pub const fn enable_bindings() -> ExternalReference {
        Self::make_ref("ɵɵenableBindings")
    }

    pub const fn disable_bindings() -> ExternalReference {
        Self::make_ref("ɵɵdisableBindings")
    }

    pub const fn pipe() -> ExternalReference {
        Self::make_ref("ɵɵpipe")
    }

    pub const fn projection() -> ExternalReference {
        Self::make_ref("ɵɵprojection")
    }

    pub const fn projection_def() -> ExternalReference {
        Self::make_ref("ɵɵprojectionDef")
    }

    pub const fn declare_let() -> ExternalReference {
        Self::make_ref("ɵɵdeclareLet")
    }

    pub const fn store_let() -> ExternalReference {
        Self::make_ref("ɵɵstoreLet")
    }

    pub const fn read_context_let() -> ExternalReference {
        Self::make_ref("ɵɵreadContextLet")
    }

    pub const fn control_create() -> ExternalReference {
        Self::make_ref("ɵɵcontrolCreate")
    }

    /* Listeners */

    pub const fn listener() -> ExternalReference {
        Self::make_ref("ɵɵlistener")
    }

    pub const fn dom_listener() -> ExternalReference {
        Self::make_ref("ɵɵdomListener")
    }

    pub const fn two_way_listener() -> ExternalReference {
        Self::make_ref("ɵɵtwoWayListener")
    }

    pub const fn synthetic_host_listener() -> ExternalReference {
        Self::make_ref("ɵɵsyntheticHostListener")
    }

    pub const fn animation_enter() -> ExternalReference {
        Self::make_ref("ɵɵanimateEnter")
    }

    pub const fn animation_leave() -> ExternalReference {
        Self::make_ref("ɵɵanimateLeave")
    }

    pub const fn animation_enter_listener() -> ExternalReference {
        Self::make_ref("ɵɵanimateEnterListener")
    }

    pub const fn animation_leave_listener() -> ExternalReference {
        Self::make_ref("ɵɵanimateLeaveListener")
    }

    pub const fn resolve_window() -> ExternalReference {
        Self::make_ref("ɵɵresolveWindow")
    }

    pub const fn resolve_document() -> ExternalReference {
        Self::make_ref("ɵɵresolveDocument")
    }

    pub const fn resolve_body() -> ExternalReference {
        Self::make_ref("ɵɵresolveBody")
    }

    /* Bindings */

    pub const fn advance() -> ExternalReference {
        Self::make_ref("ɵɵadvance")
    }

    pub const fn property() -> ExternalReference {
        Self::make_ref("ɵɵproperty")
    }

    pub const fn aria_property() -> ExternalReference {
        Self::make_ref("ɵɵariaProperty")
    }

    pub const fn dom_property() -> ExternalReference {
        Self::make_ref("ɵɵdomProperty")
    }

    pub const fn synthetic_host_property() -> ExternalReference {
        Self::make_ref("ɵɵsyntheticHostProperty")
    }

    pub const fn two_way_property() -> ExternalReference {
        Self::make_ref("ɵɵtwoWayProperty")
    }

    pub const fn two_way_binding_set() -> ExternalReference {
        Self::make_ref("ɵɵtwoWayBindingSet")
    }

    pub const fn control() -> ExternalReference {
        Self::make_ref("ɵɵcontrol")
    }

    pub const fn attribute() -> ExternalReference {
        Self::make_ref("ɵɵattribute")
    }

    pub const fn class_prop() -> ExternalReference {
        Self::make_ref("ɵɵclassProp")
    }

    pub const fn style_prop() -> ExternalReference {
        Self::make_ref("ɵɵstyleProp")
    }

    pub const fn style_map() -> ExternalReference {
        Self::make_ref("ɵɵstyleMap")
    }

    pub const fn class_map() -> ExternalReference {
        Self::make_ref("ɵɵclassMap")
    }

    pub const fn interpolate() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate")
    }

    pub const fn interpolate1() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate1")
    }

    pub const fn interpolate2() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate2")
    }

    pub const fn interpolate3() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate3")
    }

    pub const fn interpolate4() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate4")
    }

    pub const fn interpolate5() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate5")
    }

    pub const fn interpolate6() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate6")
    }

    pub const fn interpolate7() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate7")
    }

    pub const fn interpolate8() -> ExternalReference {
        Self::make_ref("ɵɵinterpolate8")
    }

    pub const fn interpolate_v() -> ExternalReference {
        Self::make_ref("ɵɵinterpolateV")
    }

    pub const fn text_interpolate() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate")
    }

    pub const fn text_interpolate1() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate1")
    }

    pub const fn text_interpolate2() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate2")
    }

    pub const fn text_interpolate3() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate3")
    }

    pub const fn text_interpolate4() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate4")
    }

    pub const fn text_interpolate5() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate5")
    }

    pub const fn text_interpolate6() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate6")
    }

    pub const fn text_interpolate7() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate7")
    }

    pub const fn text_interpolate8() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolate8")
    }

    pub const fn text_interpolate_v() -> ExternalReference {
        Self::make_ref("ɵɵtextInterpolateV")
    }

    /* Context and views */

    pub const fn next_context() -> ExternalReference {
        Self::make_ref("ɵɵnextContext")
    }

    pub const fn get_current_view() -> ExternalReference {
        Self::make_ref("ɵɵgetCurrentView")
    }

    pub const fn restore_view() -> ExternalReference {
        Self::make_ref("ɵɵrestoreView")
    }

    pub const fn reset_view() -> ExternalReference {
        Self::make_ref("ɵɵresetView")
    }

    pub const fn reference() -> ExternalReference {
        Self::make_ref("ɵɵreference")
    }

    pub const fn component_instance() -> ExternalReference {
        Self::make_ref("ɵɵcomponentInstance")
    }

    /* Pure functions and pipes */

    pub const fn pure_function0() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction0")
    }

    pub const fn pure_function1() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction1")
    }

    pub const fn pure_function2() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction2")
    }

    pub const fn pure_function3() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction3")
    }

    pub const fn pure_function4() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction4")
    }

    pub const fn pure_function5() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction5")
    }

    pub const fn pure_function6() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction6")
    }

    pub const fn pure_function7() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction7")
    }

    pub const fn pure_function8() -> ExternalReference {
        Self::make_ref("ɵɵpureFunction8")
    }

    pub const fn pure_function_v() -> ExternalReference {
        Self::make_ref("ɵɵpureFunctionV")
    }

    pub const fn pipe_bind1() -> ExternalReference {
        Self::make_ref("ɵɵpipeBind1")
    }

    pub const fn pipe_bind2() -> ExternalReference {
        Self::make_ref("ɵɵpipeBind2")
    }

    pub const fn pipe_bind3() -> ExternalReference {
        Self::make_ref("ɵɵpipeBind3")
    }

    pub const fn pipe_bind4() -> ExternalReference {
        Self::make_ref("ɵɵpipeBind4")
    }

    pub const fn pipe_bind_v() -> ExternalReference {
        Self::make_ref("ɵɵpipeBindV")
    }

    /* Control flow */

    pub const fn conditional_create() -> ExternalReference {
        Self::make_ref("ɵɵconditionalCreate")
    }

    pub const fn conditional_branch_create() -> ExternalReference {
        Self::make_ref("ɵɵconditionalBranchCreate")
    }

    pub const fn conditional() -> ExternalReference {
        Self::make_ref("ɵɵconditional")
    }

    pub const fn repeater_create() -> ExternalReference {
        Self::make_ref("ɵɵrepeaterCreate")
    }

    pub const fn repeater() -> ExternalReference {
        Self::make_ref("ɵɵrepeater")
    }

    pub const fn repeater_track_by_index() -> ExternalReference {
        Self::make_ref("ɵɵrepeaterTrackByIndex")
    }

    pub const fn repeater_track_by_identity() -> ExternalReference {
        Self::make_ref("ɵɵrepeaterTrackByIdentity")
    }

    /* Defer */

    pub const fn defer() -> ExternalReference {
        Self::make_ref("ɵɵdefer")
    }

    pub const fn defer_when() -> ExternalReference {
        Self::make_ref("ɵɵdeferWhen")
    }

    pub const fn defer_on_idle() -> ExternalReference {
        Self::make_ref("ɵɵdeferOnIdle")
    }

    pub const fn defer_on_immediate() -> ExternalReference {
        Self::make_ref("ɵɵdeferOnImmediate")
    }

    pub const fn defer_on_timer() -> ExternalReference {
        Self::make_ref("ɵɵdeferOnTimer")
    }

    pub const fn defer_on_hover() -> ExternalReference {
        Self::make_ref("ɵɵdeferOnHover")
    }

    pub const fn defer_on_interaction() -> ExternalReference {
        Self::make_ref("ɵɵdeferOnInteraction")
    }

    pub const fn defer_on_viewport() -> ExternalReference {
        Self::make_ref("ɵɵdeferOnViewport")
    }

    pub const fn defer_prefetch_when() -> ExternalReference {
        Self::make_ref("ɵɵdeferPrefetchWhen")
    }

    pub const fn defer_prefetch_on_idle() -> ExternalReference {
        Self::make_ref("ɵɵdeferPrefetchOnIdle")
    }

    pub const fn defer_prefetch_on_immediate() -> ExternalReference {
        Self::make_ref("ɵɵdeferPrefetchOnImmediate")
    }

    pub const fn defer_prefetch_on_timer() -> ExternalReference {
        Self::make_ref("ɵɵdeferPrefetchOnTimer")
    }

    pub const fn defer_prefetch_on_hover() -> ExternalReference {
        Self::make_ref("ɵɵdeferPrefetchOnHover")
    }

    pub const fn defer_prefetch_on_interaction() -> ExternalReference {
        Self::make_ref("ɵɵdeferPrefetchOnInteraction")
    }

    pub const fn defer_prefetch_on_viewport() -> ExternalReference {
        Self::make_ref("ɵɵdeferPrefetchOnViewport")
    }

    pub const fn defer_hydrate_when() -> ExternalReference {
        Self::make_ref("ɵɵdeferHydrateWhen")
    }

    pub const fn defer_hydrate_never() -> ExternalReference {
        Self::make_ref("ɵɵdeferHydrateNever")
    }

    pub const fn defer_hydrate_on_idle() -> ExternalReference {
        Self::make_ref("ɵɵdeferHydrateOnIdle")
    }

    pub const fn defer_hydrate_on_immediate() -> ExternalReference {
        Self::make_ref("ɵɵdeferHydrateOnImmediate")
    }

    pub const fn defer_hydrate_on_timer() -> ExternalReference {
        Self::make_ref("ɵɵdeferHydrateOnTimer")
    }

    pub const fn defer_hydrate_on_hover() -> ExternalReference {
        Self::make_ref("ɵɵdeferHydrateOnHover")
    }

    pub const fn defer_hydrate_on_interaction() -> ExternalReference {
        Self::make_ref("ɵɵdeferHydrateOnInteraction")
    }

    pub const fn defer_hydrate_on_viewport() -> ExternalReference {
        Self::make_ref("ɵɵdeferHydrateOnViewport")
    }

    pub const fn defer_enable_timer_scheduling() -> ExternalReference {
        Self::make_ref("ɵɵdeferEnableTimerScheduling")
    }

    /* i18n */

    pub const fn i18n() -> ExternalReference {
        Self::make_ref("ɵɵi18n")
    }

    pub const fn i18n_start() -> ExternalReference {
        Self::make_ref("ɵɵi18nStart")
    }

    pub const fn i18n_end() -> ExternalReference {
        Self::make_ref("ɵɵi18nEnd")
    }

    pub const fn i18n_exp() -> ExternalReference {
        Self::make_ref("ɵɵi18nExp")
    }

    pub const fn i18n_apply() -> ExternalReference {
        Self::make_ref("ɵɵi18nApply")
    }

    pub const fn i18n_attributes() -> ExternalReference {
        Self::make_ref("ɵɵi18nAttributes")
    }

    pub const fn i18n_postprocess() -> ExternalReference {
        Self::make_ref("ɵɵi18nPostprocess")
    }

    /* Sanitization */

    pub const fn sanitize_html() -> ExternalReference {
        Self::make_ref("ɵɵsanitizeHtml")
    }

    pub const fn sanitize_style() -> ExternalReference {
        Self::make_ref("ɵɵsanitizeStyle")
    }

    pub const fn sanitize_script() -> ExternalReference {
        Self::make_ref("ɵɵsanitizeScript")
    }

    pub const fn sanitize_url() -> ExternalReference {
        Self::make_ref("ɵɵsanitizeUrl")
    }

    pub const fn sanitize_resource_url() -> ExternalReference {
        Self::make_ref("ɵɵsanitizeResourceUrl")
    }

    pub const fn sanitize_url_or_resource_url() -> ExternalReference {
        Self::make_ref("ɵɵsanitizeUrlOrResourceUrl")
    }

    pub const fn trust_constant_html() -> ExternalReference {
        Self::make_ref("ɵɵtrustConstantHtml")
    }

    pub const fn trust_constant_resource_url() -> ExternalReference {
        Self::make_ref("ɵɵtrustConstantResourceUrl")
    }

    pub const fn validate_iframe_attribute() -> ExternalReference {
        Self::make_ref("ɵɵvalidateIframeAttribute")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_live_in_core() {
        let id = Identifiers::element_start();
        assert_eq!(id.module_name, CORE);
        assert_eq!(id.name, "ɵɵelementStart");
    }
}
