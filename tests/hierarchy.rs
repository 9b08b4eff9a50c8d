#![allow(missing_docs)]

use common::{Faulty, Resource, init_tracing};
use std::sync::Arc;
use wirebox::{
    Container, ContainerBuilder, ContainerKind, Dispose, Instance, Lifecycle, PluginType, Session,
    error::{BoxError, Error},
};

mod common;

#[derive(Debug, PartialEq)]
struct Thing(&'static str);

fn resource(label: &'static str, lifecycle: Lifecycle) -> Instance {
    Instance::lambda(move |_| Ok(Resource::new(label)))
        .with_lifecycle(lifecycle)
        .disposable::<Resource>()
}

#[test]
fn it_isolates_named_instances_between_siblings() {
    init_tracing();
    let root = Container::new();
    let first = root.create_child_container().unwrap();
    let second = root.get_nested_container().unwrap();

    first
        .configure(|builder| {
            builder.add::<Thing>(Instance::object(Thing("first")).named("A"));
        })
        .unwrap();
    second
        .configure(|builder| {
            builder.add::<Thing>(Instance::object(Thing("second")).named("A"));
        })
        .unwrap();

    assert_eq!(*first.get_named::<Thing>("A").unwrap(), Thing("first"));
    assert_eq!(*second.get_named::<Thing>("A").unwrap(), Thing("second"));
    assert!(root.try_get_named::<Thing>("A").unwrap().is_none());
}

#[test]
fn it_falls_back_to_parent_registrations() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder.register_singleton(String::from("from root"));
    let root = builder.build();

    let nested = root
        .create_child_container()
        .and_then(|child| child.get_nested_container())
        .unwrap();

    assert_eq!(nested.kind(), ContainerKind::Nested);
    assert_eq!(nested.get::<String>().unwrap().as_str(), "from root");
}

#[test]
fn it_overrides_parent_defaults_without_touching_the_parent() {
    init_tracing();
    let root = Container::new();
    root.inject(1_u32).unwrap();
    let child = root.create_child_container().unwrap();

    child.inject(2_u32).unwrap();

    assert_eq!(*child.get::<u32>().unwrap(), 2);
    assert_eq!(*root.get::<u32>().unwrap(), 1);
}

#[test]
fn it_caches_singletons_in_the_registering_container() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder.use_default::<Resource>(resource("singleton", Lifecycle::Singleton));
    let root = builder.build();
    let first = root.create_child_container().unwrap();
    let second = root.create_child_container().unwrap();

    let a = first.get::<Resource>().unwrap();
    let b = second.get::<Resource>().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &root.get::<Resource>().unwrap()));
}

#[test]
fn it_never_disposes_parent_singletons_with_a_child() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder.use_default::<Resource>(resource("singleton", Lifecycle::Singleton));
    let root = builder.build();
    let child = root.create_child_container().unwrap();

    let singleton = child.get::<Resource>().unwrap();
    child.dispose().unwrap();

    assert_eq!(singleton.disposals(), 0);
    assert!(!root.is_disposed());

    root.dispose().unwrap();
    root.dispose().unwrap();

    assert_eq!(singleton.disposals(), 1);
}

#[test]
fn it_disposes_scoped_and_transient_objects_with_the_child() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder
        .add::<Resource>(resource("scoped", Lifecycle::ContainerScoped).named("scoped"))
        .add::<Resource>(resource("transient", Lifecycle::Transient).named("transient"));
    let root = builder.build();
    let child = root.create_child_container().unwrap();

    let scoped = child.get_named::<Resource>("scoped").unwrap();
    let transient = child.get_named::<Resource>("transient").unwrap();
    let in_root = root.get_named::<Resource>("scoped").unwrap();

    child.dispose().unwrap();

    assert_eq!(scoped.disposals(), 1);
    assert_eq!(transient.disposals(), 1);
    assert_eq!(in_root.disposals(), 0);
}

#[test]
fn it_cascades_disposal_to_spawned_containers() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder.use_default::<Resource>(resource("scoped", Lifecycle::ContainerScoped));
    let root = builder.build();
    let child = root.create_child_container().unwrap();
    let nested = child.get_nested_container().unwrap();
    let in_nested = nested.get::<Resource>().unwrap();

    root.dispose().unwrap();

    assert!(child.is_disposed());
    assert!(nested.is_disposed());
    assert_eq!(in_nested.disposals(), 1);
    assert!(matches!(nested.get::<Resource>(), Err(Error::ContainerDisposed)));
}

#[test]
fn it_disposes_a_dropped_child() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder.use_default::<Resource>(resource("scoped", Lifecycle::ContainerScoped));
    let root = builder.build();
    let child = root.create_child_container().unwrap();
    let scoped = child.get::<Resource>().unwrap();

    drop(child);
    root.dispose().unwrap();

    assert_eq!(scoped.disposals(), 1);
}

#[test]
fn it_disposes_a_dropped_nested_container_once() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder.use_default::<Resource>(resource("hybrid", Lifecycle::Hybrid));
    let root = builder.build();
    let nested = root.get_nested_container().unwrap();
    let hybrid = nested.get::<Resource>().unwrap();

    drop(nested);

    assert_eq!(hybrid.disposals(), 1);

    root.dispose().unwrap();

    assert_eq!(hybrid.disposals(), 1);
}

#[test]
fn it_disposes_objects_injected_into_a_nested_container() {
    init_tracing();
    let root = Container::new();
    root.inject_disposable(Resource::new("in root")).unwrap();
    let nested = root.get_nested_container().unwrap();
    nested.inject_disposable(Resource::new("in nested")).unwrap();

    let injected = nested.get::<Resource>().unwrap();
    let from_root = root.get::<Resource>().unwrap();
    nested.dispose().unwrap();

    assert_eq!(injected.label, "in nested");
    assert_eq!(injected.disposals(), 1);
    assert_eq!(from_root.disposals(), 0);
    assert!(!root.is_disposed());
}

struct ContainerOwner {
    container: Container,
}

impl Dispose for ContainerOwner {
    fn dispose(&self) -> Result<(), BoxError> {
        self.container.dispose().map_err(Into::into)
    }
}

#[test]
fn it_ignores_reentrant_disposal() {
    init_tracing();
    let child = Container::new().create_child_container().unwrap();
    child
        .configure(|builder| {
            builder.use_default::<ContainerOwner>(
                Instance::lambda(|session: &mut Session<'_>| Ok(ContainerOwner { container: session.container()? }))
                    .with_lifecycle(Lifecycle::ContainerScoped)
                    .disposable::<ContainerOwner>(),
            );
        })
        .unwrap();
    child.get::<ContainerOwner>().unwrap();

    child.dispose().unwrap();

    assert!(child.is_disposed());
}

#[test]
fn it_disposes_objects_whose_build_outlived_the_container() {
    init_tracing();
    let child = Container::new().create_child_container().unwrap();
    child
        .configure(|builder| {
            builder.use_default::<Resource>(
                Instance::lambda(|session: &mut Session<'_>| {
                    session.container()?.dispose()?;
                    Ok(Resource::new("late"))
                })
                .with_lifecycle(Lifecycle::ContainerScoped)
                .disposable::<Resource>(),
            );
        })
        .unwrap();

    let late = child.get::<Resource>().unwrap();

    assert!(child.is_disposed());
    assert_eq!(late.disposals(), 1);
}

#[test]
fn it_disposes_everything_and_collects_failures() {
    init_tracing();
    let resource = Arc::new(Resource::new("injected"));
    let root = Container::new();
    root.inject_disposable(Faulty).unwrap();
    root.inject_instance(
        PluginType::of::<Resource>(),
        Instance::shared(resource.clone()).disposable::<Resource>(),
    )
    .unwrap();

    let err = root.dispose().unwrap_err();

    let Error::Disposal(failures) = err else {
        panic!("expected a disposal error");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(resource.disposals(), 1);
    assert!(root.dispose().is_ok());
}

#[test]
fn it_rejects_singletons_in_nested_containers() {
    init_tracing();
    let nested = Container::new().get_nested_container().unwrap();

    let err = nested
        .configure(|builder| {
            builder.register_singleton_default::<Resource>();
        })
        .unwrap_err();

    assert!(matches!(err, Error::SingletonInNestedContainer(pt) if pt.is::<Resource>()));
    assert!(nested.try_get::<Resource>().unwrap().is_none());
}

#[test]
fn it_prefers_nearer_layers_for_collections() {
    init_tracing();
    let mut builder = ContainerBuilder::new();
    builder
        .add::<Thing>(Instance::object(Thing("root a")).named("a"))
        .add::<Thing>(Instance::object(Thing("root b")).named("b"));
    let root = builder.build();
    let child = root.create_child_container().unwrap();
    child
        .configure(|builder| {
            builder
                .add::<Thing>(Instance::object(Thing("child b")).named("b"))
                .add::<Thing>(Instance::object(Thing("child c")).named("c"));
        })
        .unwrap();

    let things = child.get_all::<Thing>().unwrap();
    let labels = things.iter().map(|t| t.0).collect::<Vec<_>>();

    assert_eq!(labels, ["root a", "child b", "child c"]);
    assert_eq!(root.get_all::<Thing>().unwrap().len(), 2);
}
