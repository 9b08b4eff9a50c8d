//! Factory functions whose parameters are resolved from the session

use crate::{
    error::Error,
    session::{FromSession, Session},
};

/// A function that builds an object from values it extracts from a
/// resolution [`Session`].
///
/// Every parameter is a [`FromSession`] extractor, such as [`Dc<T>`](crate::Dc)
/// for a dependency or [`Container`](crate::Container) for the resolving
/// container. Parameters are extracted left to right within the session that
/// builds the object, so cycles through them are reported as
/// [`Error::BidirectionalDependency`].
///
/// A function without parameters returns the object itself. A function with
/// parameters returns a `Result`, so extraction and building errors both
/// propagate through `?`.
pub trait GenericFactory<Args: FromSession>: Send + Sync + 'static {
    /// The object the factory builds
    type Output;

    /// Invokes the factory with already extracted arguments
    fn invoke(&self, args: Args) -> Result<Self::Output, Error>;

    /// Extracts the arguments from `session` and invokes the factory
    #[inline]
    fn build(&self, session: &mut Session<'_>) -> Result<Self::Output, Error> {
        Args::from_session(session).and_then(|args| self.invoke(args))
    }
}

impl<F, R> GenericFactory<()> for F
where
    F: Fn() -> R + Send + Sync + 'static,
{
    type Output = R;

    #[inline]
    fn invoke(&self, (): ()) -> Result<R, Error> {
        Ok(self())
    }
}

macro_rules! impl_factory_with_args {
    ($($arg:ident),+) => {
        impl<F, R, $($arg: FromSession),+> GenericFactory<($($arg,)+)> for F
        where
            F: Fn($($arg),+) -> Result<R, Error> + Send + Sync + 'static,
        {
            type Output = R;

            #[inline]
            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)+): ($($arg,)+)) -> Result<R, Error> {
                self($($arg),+)
            }
        }
    };
}

impl_factory_with_args! { A1 }
impl_factory_with_args! { A1, A2 }
impl_factory_with_args! { A1, A2, A3 }
impl_factory_with_args! { A1, A2, A3, A4 }
impl_factory_with_args! { A1, A2, A3, A4, A5 }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Container, ContainerBuilder, Dc, PluginGraph, PluginType, Instance};

    #[derive(Debug, Clone, Copy)]
    struct X(i32);

    #[derive(Debug, Clone, Copy)]
    struct Y(i32);

    #[derive(Debug, Clone, Copy)]
    struct Point(X, Y);

    #[test]
    fn it_builds_from_extracted_dependencies() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_transient_factory(|| X(1))
            .register_transient_factory(|| Y(2))
            .register_transient_factory(|x: Dc<X>, y: Dc<Y>| Ok(Point(*x, *y)));

        let container = builder.build();

        let point = container.get::<Point>().unwrap();

        assert_eq!(point.0.0, 1);
        assert_eq!(point.1.0, 2);
    }

    #[test]
    fn it_builds_from_container() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_transient_factory(|| X(1))
            .register_transient_factory(|| Y(2))
            .register_transient_factory(|c: Container| {
                let x: X = c.resolve()?;
                let y: Y = c.resolve()?;
                Ok(Point(x, y))
            });

        let container = builder.build();

        let point = container.resolve::<Point>().unwrap();

        assert_eq!(point.0.0, 1);
        assert_eq!(point.1.0, 2);
    }

    #[test]
    fn it_propagates_factory_errors() {
        let mut builder = ContainerBuilder::new();
        builder.register_transient_factory(|_: ()| -> Result<X, Error> { Err(Error::factory("no X today")) });

        let err = builder.build().get::<X>().unwrap_err();

        assert!(matches!(err.root_cause(), Error::Factory(_)));
    }

    #[test]
    fn it_extracts_arguments_within_the_building_session() {
        let graph = PluginGraph::new();
        graph.set_default(PluginType::of::<X>(), Instance::object(X(3)));
        let factory = |x: Dc<X>, missing: Option<Dc<Y>>| -> Result<Point, Error> {
            Ok(Point(*x, missing.map_or(Y(0), |y| *y)))
        };

        let point = factory.build(&mut Session::new(&graph)).unwrap();

        assert_eq!(point.0.0, 3);
        assert_eq!(point.1.0, 0);
    }
}
