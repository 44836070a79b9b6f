//! Immutable tree descriptions.
//!
//! An [`Element`] is plain data: a type plus props plus children. Elements are
//! cheap to clone and never change once built; the fiber tree is where all
//! mutable bookkeeping lives.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use crate::hash::OrderedMap;
use crate::NodeId;

/// Prop carrying the text of a text element.
pub const NODE_VALUE: &str = "nodeValue";

const EVENT_PREFIX: &str = "on";

/// Event delivered to listeners registered through `on*` props.
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    pub value: Option<PropValue>,
}

pub type EventHandler = Rc<dyn Fn(&Event)>;

#[derive(Clone)]
pub enum PropValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Listener(EventHandler),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Listener(handler) => Some(handler),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            // Listeners compare by identity, like function references.
            (PropValue::Listener(a), PropValue::Listener(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => write!(f, "{value:?}"),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Listener(handler) => write!(f, "<listener {:p}>", Rc::as_ptr(handler)),
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

/// Returns true when `name` designates an event listener prop (`onClick`).
pub fn is_event(name: &str) -> bool {
    name.starts_with(EVENT_PREFIX)
}

/// Event type a listener prop subscribes to: `onClick` becomes `click`.
pub fn event_type(name: &str) -> String {
    name[EVENT_PREFIX.len()..].to_lowercase()
}

/// Attributes of an element plus its ordered children.
#[derive(Clone, Default)]
pub struct Props {
    attributes: OrderedMap<Rc<str>, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.attributes.insert(Rc::from(name), value.into());
        self
    }

    /// Registers `handler` under the listener prop `name`, e.g. `onClick`.
    pub fn on(mut self, name: &str, handler: impl Fn(&Event) + 'static) -> Self {
        debug_assert!(is_event(name), "listener prop `{name}` must start with `on`");
        self.attributes
            .insert(Rc::from(name), PropValue::Listener(Rc::new(handler)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropValue::as_int)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Every attribute in insertion order, `children` excluded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_ref(), value))
    }

    /// Plain properties: attributes that are not listeners.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.iter().filter(|(name, _)| !is_event(name))
    }

    /// Listener props paired with their handlers.
    pub fn listeners(&self) -> impl Iterator<Item = (&str, &EventHandler)> {
        self.iter().filter(|(name, _)| is_event(name)).filter_map(
            |(name, value)| value.as_listener().map(|handler| (name, handler)),
        )
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .finish()
    }
}

/// Native node kinds understood by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostTag {
    Text,
    Element(Rc<str>),
}

type RenderFn = dyn Fn(&Props) -> anyhow::Result<Element>;

/// A function producing one element from props.
///
/// Two components are the same type when they share a name and were built
/// from the same Rust function or closure definition, regardless of captured
/// values. Function pointers all share one Rust type, so components stored
/// as `fn` values are told apart by name alone.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    identity: TypeId,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: &'static str, render: F) -> Self
    where
        F: Fn(&Props) -> Element + 'static,
    {
        Self {
            name,
            identity: TypeId::of::<F>(),
            render: Rc::new(move |props: &Props| Ok::<_, anyhow::Error>(render(props))),
        }
    }

    /// Builds a component whose render may fail and abort the render pass.
    pub fn try_new<F>(name: &'static str, render: F) -> Self
    where
        F: Fn(&Props) -> anyhow::Result<Element> + 'static,
    {
        Self {
            name,
            identity: TypeId::of::<F>(),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Element rendering this component with `props` and no children.
    pub fn element(&self, props: Props) -> Element {
        Element {
            element_type: ElementType::Component(self.clone()),
            props: Rc::new(props),
        }
    }

    pub(crate) fn render(&self, props: &Props) -> anyhow::Result<Element> {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && self.name == other.name
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    Host(HostTag),
    Component(Component),
}

impl ElementType {
    pub fn is_component(&self) -> bool {
        matches!(self, ElementType::Component(_))
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(HostTag::Element(Rc::from(tag)))
    }
}

impl From<HostTag> for ElementType {
    fn from(tag: HostTag) -> Self {
        ElementType::Host(tag)
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

impl From<&Component> for ElementType {
    fn from(component: &Component) -> Self {
        ElementType::Component(component.clone())
    }
}

#[derive(Clone)]
pub struct Element {
    element_type: ElementType,
    props: Rc<Props>,
}

impl Element {
    pub fn element_type(&self) -> &ElementType {
        &self.element_type
    }

    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type", &self.element_type)
            .field("props", &self.props)
            .finish()
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        text(value)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        text(value)
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        text(value)
    }
}

pub(crate) fn with_children(mut props: Props, children: Vec<Element>) -> Props {
    props.children = children;
    props
}

/// Builds an element. Bare strings and numbers among `children` become text
/// elements.
pub fn create_element<C: Into<Element>>(
    element_type: impl Into<ElementType>,
    props: Props,
    children: impl IntoIterator<Item = C>,
) -> Element {
    let children = children.into_iter().map(Into::into).collect();
    Element {
        element_type: element_type.into(),
        props: Rc::new(with_children(props, children)),
    }
}

/// Text element with a single `nodeValue` prop and no children.
pub fn text(value: impl Into<PropValue>) -> Element {
    Element {
        element_type: ElementType::Host(HostTag::Text),
        props: Rc::new(Props::new().with(NODE_VALUE, value)),
    }
}
