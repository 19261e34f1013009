//! Application model of an endpoint: the mutable view conventions work on.
//!
//! Built once per endpoint after synthesis; conventions rename endpoints and actions and
//! adjust selector constraints; the REST adapter then reads the final state.

use http::Method;

use crate::endpoint::{ActionDescriptor, DeclaredSelector, EndpointType};
use crate::type_info::TypeInfo;

/// Deduplicated, order-preserving set of accepted HTTP methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMethodConstraint {
    methods: Vec<Method>,
}

impl HttpMethodConstraint {
    #[must_use]
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut unique: Vec<Method> = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        Self { methods: unique }
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionConstraint {
    HttpMethod(HttpMethodConstraint),
    /// Accepted request content types, e.g. `application/json`.
    Consumes(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorModel {
    constraints: Vec<ActionConstraint>,
    route: Option<String>,
}

impl SelectorModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: ActionConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    #[must_use]
    pub fn constraints(&self) -> &[ActionConstraint] {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut Vec<ActionConstraint> {
        &mut self.constraints
    }

    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn set_route(&mut self, route: Option<String>) {
        self.route = route;
    }

    pub fn http_method_constraints(&self) -> impl Iterator<Item = &HttpMethodConstraint> {
        self.constraints.iter().filter_map(|constraint| match constraint {
            ActionConstraint::HttpMethod(methods) => Some(methods),
            ActionConstraint::Consumes(_) => None,
        })
    }

    /// Add `verbs` to the selector's method constraints.
    ///
    /// Without a method constraint a new one holding exactly `verbs` is added. Otherwise
    /// each existing method constraint is replaced in place by the deduplicated union of
    /// `verbs` followed by its previous methods. Other constraint kinds are untouched.
    pub fn merge_http_methods(&mut self, verbs: &[Method]) {
        let mut found = false;
        for constraint in &mut self.constraints {
            if let ActionConstraint::HttpMethod(existing) = constraint {
                found = true;
                *existing = HttpMethodConstraint::new(
                    verbs.iter().chain(existing.methods.iter()).cloned(),
                );
            }
        }

        if !found {
            self.constraints
                .push(ActionConstraint::HttpMethod(HttpMethodConstraint::new(
                    verbs.iter().cloned(),
                )));
        }
    }

    /// Methods accepted by every method constraint; `None` when unconstrained.
    #[must_use]
    pub fn allowed_methods(&self) -> Option<Vec<Method>> {
        let mut constraints = self.http_method_constraints();
        let first = constraints.next()?;
        let mut allowed = first.methods.clone();
        for constraint in constraints {
            allowed.retain(|method| constraint.allows(method));
        }
        Some(allowed)
    }

    /// Accepted content types across `Consumes` constraints; `None` when unconstrained.
    #[must_use]
    pub fn consumes(&self) -> Option<Vec<&str>> {
        let mut types = self
            .constraints
            .iter()
            .filter_map(|constraint| match constraint {
                ActionConstraint::Consumes(types) => Some(types),
                ActionConstraint::HttpMethod(_) => None,
            })
            .peekable();
        types.peek()?;
        Some(types.flatten().map(String::as_str).collect())
    }
}

impl From<&DeclaredSelector> for SelectorModel {
    fn from(declared: &DeclaredSelector) -> Self {
        let mut selector = Self::new();
        if !declared.methods().is_empty() {
            selector.constraints.push(ActionConstraint::HttpMethod(HttpMethodConstraint::new(
                declared.methods().iter().cloned(),
            )));
        }
        selector.route = declared.route().map(str::to_owned);
        selector
    }
}

#[derive(Debug, Clone)]
pub struct ActionModel {
    descriptor: ActionDescriptor,
    action_name: String,
    selectors: Vec<SelectorModel>,
}

impl ActionModel {
    /// Actions declaring no selector get one unconstrained selector.
    #[must_use]
    pub fn new(descriptor: ActionDescriptor) -> Self {
        let mut selectors: Vec<SelectorModel> =
            descriptor.selectors().iter().map(SelectorModel::from).collect();
        if selectors.is_empty() {
            selectors.push(SelectorModel::new());
        }

        Self {
            action_name: descriptor.name().to_owned(),
            descriptor,
            selectors,
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn set_action_name(&mut self, name: impl Into<String>) {
        self.action_name = name.into();
    }

    #[must_use]
    pub fn selectors(&self) -> &[SelectorModel] {
        &self.selectors
    }

    pub fn selectors_mut(&mut self) -> &mut [SelectorModel] {
        &mut self.selectors
    }
}

#[derive(Debug, Clone)]
pub struct EndpointModel {
    endpoint: EndpointType,
    name: String,
    actions: Vec<ActionModel>,
}

impl EndpointModel {
    #[must_use]
    pub fn new(endpoint: EndpointType) -> Self {
        let actions = endpoint
            .actions()
            .iter()
            .cloned()
            .map(ActionModel::new)
            .collect();

        Self {
            name: endpoint.name(),
            endpoint,
            actions,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &EndpointType {
        &self.endpoint
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Bound request type of a synthesized endpoint.
    #[must_use]
    pub fn request_type(&self) -> Option<TypeInfo> {
        self.endpoint.type_arguments().first().copied()
    }

    #[must_use]
    pub fn actions(&self) -> &[ActionModel] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut [ActionModel] {
        &mut self.actions
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn methods(selector: &SelectorModel) -> Vec<Vec<Method>> {
        selector
            .http_method_constraints()
            .map(|c| c.methods().to_vec())
            .collect()
    }

    #[test]
    fn merge_adds_constraint_when_none_exists() {
        let mut selector = SelectorModel::new();
        selector.merge_http_methods(&[Method::GET]);
        assert_eq!(methods(&selector), vec![vec![Method::GET]]);
    }

    #[test]
    fn merge_widens_each_existing_constraint() {
        let mut selector = SelectorModel::new()
            .with_constraint(ActionConstraint::Consumes(vec!["application/json".to_owned()]))
            .with_constraint(ActionConstraint::HttpMethod(HttpMethodConstraint::new([Method::DELETE])))
            .with_constraint(ActionConstraint::HttpMethod(HttpMethodConstraint::new([
                Method::POST,
                Method::PUT,
            ])));

        selector.merge_http_methods(&[Method::POST]);

        assert_eq!(
            methods(&selector),
            vec![vec![Method::POST, Method::DELETE], vec![Method::POST, Method::PUT]]
        );
        assert_eq!(selector.consumes(), Some(vec!["application/json"]));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut once = SelectorModel::new()
            .with_constraint(ActionConstraint::HttpMethod(HttpMethodConstraint::new([Method::DELETE])));
        once.merge_http_methods(&[Method::POST]);

        let mut twice = once.clone();
        twice.merge_http_methods(&[Method::POST]);

        assert_eq!(once, twice);
    }

    #[test]
    fn allowed_methods_intersects_constraints() {
        let selector = SelectorModel::new()
            .with_constraint(ActionConstraint::HttpMethod(HttpMethodConstraint::new([
                Method::GET,
                Method::POST,
            ])))
            .with_constraint(ActionConstraint::HttpMethod(HttpMethodConstraint::new([Method::POST])));

        assert_eq!(selector.allowed_methods(), Some(vec![Method::POST]));
        assert_eq!(SelectorModel::new().allowed_methods(), None);
        assert_eq!(SelectorModel::new().consumes(), None);
    }

    #[test]
    fn actions_without_selectors_get_one() {
        let action = ActionModel::new(ActionDescriptor::new("Index"));
        assert_eq!(action.selectors().len(), 1);
        assert_eq!(action.action_name(), "Index");
    }
}
