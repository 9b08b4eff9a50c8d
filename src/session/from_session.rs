//! Extractors for fetching factory arguments from a resolution session

use crate::{Container, Dc, error::Error, session::Session};

/// A trait that defines how to extract `Self` from a resolution [`Session`]
pub trait FromSession: Sized + Send + Sync {
    /// Extracts `Self` from the session
    fn from_session(session: &mut Session<'_>) -> Result<Self, Error>;
}

/// Extracts the resolving container.
///
/// Calls made on the extracted container start a session of their own: they
/// do not see the explicit arguments or the per-request objects of the
/// current call, and a cycle that runs through them is not reported as
/// [`Error::BidirectionalDependency`]. When such a cycle passes through a
/// shared cache it blocks forever on that cache's entry. Extract dependencies
/// with [`Dc<T>`] instead when they are known up front.
impl FromSession for Container {
    #[inline]
    fn from_session(session: &mut Session<'_>) -> Result<Self, Error> {
        session.container()
    }
}

impl FromSession for () {
    #[inline]
    fn from_session(_: &mut Session<'_>) -> Result<Self, Error> {
        Ok(())
    }
}

impl<T: Send + Sync + 'static> FromSession for Dc<T> {
    #[inline]
    fn from_session(session: &mut Session<'_>) -> Result<Self, Error> {
        session.get::<T>().map(Dc::from)
    }
}

impl<T: Send + Sync + 'static> FromSession for Option<Dc<T>> {
    #[inline]
    fn from_session(session: &mut Session<'_>) -> Result<Self, Error> {
        session.try_get::<T>().map(|t| t.map(Dc::from))
    }
}

macro_rules! define_generic_from_session {
    ($($T: ident),*) => {
        impl<$($T: FromSession),+> FromSession for ($($T,)+) {
            #[inline]
            #[allow(non_snake_case)]
            fn from_session(session: &mut Session<'_>) -> Result<Self, Error> {
                let tuple = (
                    $(
                    $T::from_session(session)?,
                    )*
                );
                Ok(tuple)
            }
        }
    }
}

define_generic_from_session! { T1 }
define_generic_from_session! { T1, T2 }
define_generic_from_session! { T1, T2, T3 }
define_generic_from_session! { T1, T2, T3, T4 }
define_generic_from_session! { T1, T2, T3, T4, T5 }
