//! Endpoint templates: parametric endpoint descriptions bound per request type.
//!
//! A template is either a type definition (open parameters) or a constructed template
//! (bound arguments). Every usable template derives, through its parent chain, from one
//! of the recognized [`BaseTemplate`]s.

use std::fmt;
use std::sync::Arc;

use crate::endpoint::{ActionDescriptor, DeclaredSelector};
use crate::error::BindError;
use crate::type_info::TypeInfo;

/// Name of the action every default template declares.
pub const INDEX_ACTION: &str = "Index";

/// Closed set of recognized base templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseTemplate {
    /// `EndpointBase<TRequest>`
    Endpoint,
    /// `EndpointBase<TRequest, TResponse>`
    EndpointWithResponse,
}

impl BaseTemplate {
    pub const ALL: [Self; 2] = [Self::Endpoint, Self::EndpointWithResponse];

    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Endpoint => 1,
            Self::EndpointWithResponse => 2,
        }
    }
}

impl fmt::Display for BaseTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Endpoint => "EndpointBase<TRequest>",
            Self::EndpointWithResponse => "EndpointBase<TRequest, TResponse>",
        })
    }
}

/// Predicate a type argument must satisfy to bind a [`TypeParam`].
#[derive(Clone)]
pub struct TypeConstraint {
    description: String,
    predicate: Arc<dyn Fn(&TypeInfo) -> bool + Send + Sync>,
}

impl TypeConstraint {
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&TypeInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Only `T` binds.
    #[must_use]
    pub fn exactly<T: ?Sized + 'static>() -> Self {
        let expected = TypeInfo::of::<T>();
        Self::new(format!("must be `{expected}`"), move |arg| *arg == expected)
    }

    #[must_use]
    pub fn one_of(types: impl IntoIterator<Item = TypeInfo>) -> Self {
        let allowed: Vec<TypeInfo> = types.into_iter().collect();
        let names = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(format!("must be one of [{names}]"), move |arg| {
            allowed.contains(arg)
        })
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn is_satisfied_by(&self, argument: &TypeInfo) -> bool {
        (self.predicate)(argument)
    }
}

impl fmt::Debug for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConstraint")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    name: &'static str,
    constraint: Option<TypeConstraint>,
}

impl TypeParam {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            constraint: None,
        }
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: TypeConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn constraint(&self) -> Option<&TypeConstraint> {
        self.constraint.as_ref()
    }
}

#[derive(Debug, Clone)]
pub enum TemplateParams {
    /// Type definition: parameters still to be bound.
    Open(Vec<TypeParam>),
    /// Constructed template.
    Bound(Vec<TypeInfo>),
}

#[derive(Debug, Clone)]
pub enum Ancestor {
    Base(BaseTemplate),
    Template(Arc<EndpointTemplate>),
}

/// Action parameter of a template, resolved when the template is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionParam {
    /// Positional type argument of the template (`0` is the request).
    TypeArgument(usize),
    Fixed(TypeInfo),
}

#[derive(Debug, Clone)]
pub struct ActionTemplate {
    name: String,
    parameters: Vec<ActionParam>,
    selectors: Vec<DeclaredSelector>,
}

impl ActionTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            selectors: Vec::new(),
        }
    }

    /// `Index(TRequest request)` with a single unconstrained selector.
    #[must_use]
    pub fn index() -> Self {
        Self::new(INDEX_ACTION)
            .with_request_parameter()
            .with_selector(DeclaredSelector::new())
    }

    #[must_use]
    pub fn with_request_parameter(self) -> Self {
        self.with_parameter(ActionParam::TypeArgument(0))
    }

    #[must_use]
    pub fn with_parameter(mut self, parameter: ActionParam) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: DeclaredSelector) -> Self {
        self.selectors.push(selector);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parameters(&self) -> &[ActionParam] {
        &self.parameters
    }

    /// Resolve against bound type arguments. Positional parameters past the end of
    /// `args` are dropped.
    #[must_use]
    pub fn bind(&self, args: &[TypeInfo]) -> ActionDescriptor {
        let parameters = self.parameters.iter().filter_map(|param| match param {
            ActionParam::TypeArgument(idx) => args.get(*idx).copied(),
            ActionParam::Fixed(ty) => Some(*ty),
        });

        let mut action = ActionDescriptor::new(self.name.clone()).with_parameters(parameters);
        for selector in &self.selectors {
            action = action.with_selector(selector.clone());
        }
        action
    }
}

/// Blueprint of an endpoint served for a request type.
#[derive(Debug, Clone)]
pub struct EndpointTemplate {
    name: String,
    params: TemplateParams,
    parent: Option<Ancestor>,
    actions: Vec<ActionTemplate>,
}

impl EndpointTemplate {
    /// Open template definition with the given parameters and no parent.
    #[must_use]
    pub fn definition(
        name: impl Into<String>,
        params: impl IntoIterator<Item = TypeParam>,
    ) -> Self {
        Self {
            name: name.into(),
            params: TemplateParams::Open(params.into_iter().collect()),
            parent: None,
            actions: Vec::new(),
        }
    }

    /// `MediatorEndpoint<TRequest, TResponse>`: derives from
    /// [`BaseTemplate::EndpointWithResponse`], serves `Index`.
    #[must_use]
    pub fn mediator_endpoint() -> Self {
        Self::definition(
            "MediatorEndpoint",
            [TypeParam::new("TRequest"), TypeParam::new("TResponse")],
        )
        .extends_base(BaseTemplate::EndpointWithResponse)
        .with_action(ActionTemplate::index())
    }

    /// `VoidMediatorEndpoint<TRequest>`: derives from [`BaseTemplate::Endpoint`],
    /// serves `Index`.
    #[must_use]
    pub fn void_mediator_endpoint() -> Self {
        Self::definition("VoidMediatorEndpoint", [TypeParam::new("TRequest")])
            .extends_base(BaseTemplate::Endpoint)
            .with_action(ActionTemplate::index())
    }

    #[must_use]
    pub fn extends_base(mut self, base: BaseTemplate) -> Self {
        self.parent = Some(Ancestor::Base(base));
        self
    }

    #[must_use]
    pub fn extends(mut self, parent: Arc<EndpointTemplate>) -> Self {
        self.parent = Some(Ancestor::Template(parent));
        self
    }

    /// Declare an action. An action named like an inherited one overrides it.
    #[must_use]
    pub fn with_action(mut self, action: ActionTemplate) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &TemplateParams {
        &self.params
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Ancestor> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn is_type_definition(&self) -> bool {
        matches!(self.params, TemplateParams::Open(_))
    }

    /// Number of type parameters (open) or arguments (bound).
    #[must_use]
    pub fn arity(&self) -> usize {
        match &self.params {
            TemplateParams::Open(params) => params.len(),
            TemplateParams::Bound(args) => args.len(),
        }
    }

    /// Bound type arguments; empty for a type definition.
    #[must_use]
    pub fn type_arguments(&self) -> &[TypeInfo] {
        match &self.params {
            TemplateParams::Open(_) => &[],
            TemplateParams::Bound(args) => args,
        }
    }

    /// First recognized base reached by walking the parent chain.
    #[must_use]
    pub fn recognized_base(&self) -> Option<BaseTemplate> {
        let mut current = self.parent.as_ref();
        while let Some(ancestor) = current {
            match ancestor {
                Ancestor::Base(base) => return Some(*base),
                Ancestor::Template(template) => current = template.parent.as_ref(),
            }
        }
        None
    }

    /// Generic construction: bind every open parameter, in order, to `args`.
    ///
    /// # Errors
    /// [`BindError::AlreadyBound`] for a constructed template,
    /// [`BindError::ArityMismatch`] when `args` does not match the parameter count,
    /// [`BindError::ConstraintViolated`] when an argument fails a parameter constraint.
    pub fn bind(&self, args: &[TypeInfo]) -> Result<Self, BindError> {
        let TemplateParams::Open(params) = &self.params else {
            return Err(BindError::AlreadyBound {
                template: self.to_string(),
            });
        };

        if params.len() != args.len() {
            return Err(BindError::ArityMismatch {
                template: self.to_string(),
                expected: params.len(),
                provided: args.len(),
            });
        }

        for (param, arg) in params.iter().zip(args) {
            if let Some(constraint) = &param.constraint
                && !constraint.is_satisfied_by(arg)
            {
                return Err(BindError::ConstraintViolated {
                    parameter: param.name,
                    constraint: constraint.description.clone(),
                    argument: arg.full_name().to_owned(),
                });
            }
        }

        Ok(Self {
            name: self.name.clone(),
            params: TemplateParams::Bound(args.to_vec()),
            parent: self.parent.clone(),
            actions: self.actions.clone(),
        })
    }

    /// Own and inherited actions, base-most first; same-named actions are overridden
    /// in place by the more derived declaration.
    #[must_use]
    pub fn effective_actions(&self) -> Vec<&ActionTemplate> {
        let mut chain = vec![self];
        let mut current = self.parent.as_ref();
        while let Some(Ancestor::Template(template)) = current {
            chain.push(template.as_ref());
            current = template.parent.as_ref();
        }

        let mut actions: Vec<&ActionTemplate> = Vec::new();
        for template in chain.into_iter().rev() {
            for action in &template.actions {
                match actions.iter_mut().find(|a| a.name == action.name) {
                    Some(slot) => *slot = action,
                    None => actions.push(action),
                }
            }
        }
        actions
    }

    /// Effective actions resolved against the bound type arguments.
    #[must_use]
    pub fn bound_actions(&self) -> Vec<ActionDescriptor> {
        let args = self.type_arguments();
        self.effective_actions()
            .into_iter()
            .map(|action| action.bind(args))
            .collect()
    }
}

impl fmt::Display for EndpointTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = match &self.params {
            TemplateParams::Open(params) => params.iter().map(|p| p.name.to_owned()).collect(),
            TemplateParams::Bound(args) => args.iter().map(ToString::to_string).collect(),
        };
        write!(f, "{}<{}>", self.name, args.join(", "))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::Method;

    struct GetUser;

    #[test]
    fn defaults_derive_from_matching_base() {
        let with_response = EndpointTemplate::mediator_endpoint();
        assert_eq!(with_response.recognized_base(), Some(BaseTemplate::EndpointWithResponse));
        assert_eq!(with_response.arity(), 2);
        assert_eq!(with_response.to_string(), "MediatorEndpoint<TRequest, TResponse>");

        let void = EndpointTemplate::void_mediator_endpoint();
        assert_eq!(void.recognized_base(), Some(BaseTemplate::Endpoint));
        assert_eq!(void.arity(), 1);
    }

    #[test]
    fn recognized_base_walks_template_ancestors() {
        let middle = Arc::new(EndpointTemplate::mediator_endpoint());
        let derived = EndpointTemplate::definition(
            "AuditedEndpoint",
            [TypeParam::new("TRequest"), TypeParam::new("TResponse")],
        )
        .extends(middle);
        assert_eq!(derived.recognized_base(), Some(BaseTemplate::EndpointWithResponse));

        let orphan = EndpointTemplate::definition("Plain", [TypeParam::new("TRequest")]);
        assert_eq!(orphan.recognized_base(), None);
    }

    #[test]
    fn bind_produces_constructed_template() {
        let bound = EndpointTemplate::mediator_endpoint()
            .bind(&[TypeInfo::of::<GetUser>(), TypeInfo::of::<String>()])
            .unwrap();

        assert!(!bound.is_type_definition());
        assert_eq!(bound.to_string(), "MediatorEndpoint<GetUser, String>");
        assert_eq!(bound.recognized_base(), Some(BaseTemplate::EndpointWithResponse));

        let again = bound.bind(&[TypeInfo::of::<GetUser>(), TypeInfo::of::<String>()]);
        assert!(matches!(again, Err(BindError::AlreadyBound { .. })));
    }

    #[test]
    fn bind_checks_arity_and_constraints() {
        let err = EndpointTemplate::void_mediator_endpoint()
            .bind(&[TypeInfo::of::<GetUser>(), TypeInfo::of::<String>()])
            .unwrap_err();
        assert!(matches!(err, BindError::ArityMismatch { expected: 1, provided: 2, .. }));

        let strict = EndpointTemplate::definition(
            "StringOnly",
            [
                TypeParam::new("TRequest"),
                TypeParam::new("TResponse").with_constraint(TypeConstraint::exactly::<String>()),
            ],
        );
        let err = strict
            .bind(&[TypeInfo::of::<GetUser>(), TypeInfo::of::<i32>()])
            .unwrap_err();
        assert!(matches!(err, BindError::ConstraintViolated { parameter: "TResponse", .. }));
        assert!(strict.bind(&[TypeInfo::of::<GetUser>(), TypeInfo::of::<String>()]).is_ok());
    }

    #[test]
    fn derived_action_overrides_inherited_one() {
        let derived = EndpointTemplate::definition("DeleteEndpoint", [TypeParam::new("TRequest")])
            .extends(Arc::new(EndpointTemplate::void_mediator_endpoint()))
            .with_action(
                ActionTemplate::new(INDEX_ACTION)
                    .with_request_parameter()
                    .with_selector(DeclaredSelector::new().with_methods([Method::DELETE])),
            )
            .with_action(ActionTemplate::new("Describe"));

        let bound = derived.bind(&[TypeInfo::of::<GetUser>()]).unwrap();
        let actions = bound.bound_actions();

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].name(), INDEX_ACTION);
        assert_eq!(actions[0].selectors()[0].methods(), &[Method::DELETE]);
        assert_eq!(actions[0].parameters(), &[TypeInfo::of::<GetUser>()]);
        assert_eq!(actions[1].name(), "Describe");
    }
}
