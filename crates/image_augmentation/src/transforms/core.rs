use anyhow::{Context, Result};
use std::marker::PhantomData;

/// A single preprocessing step from `I` to `O`.
///
/// Steps compose with `.then(...)` into one statically dispatched
/// pipeline, e.g. decode -> tensor -> random resized crop:
///
/// ```ignore
/// let pipeline = EnsureRGB
///     .then(ToTensor)
///     .then(RandomResizedCrop::new(config));
/// let out: Array3<f32> = pipeline.apply(image)?;
/// ```
///
/// `then()` requires the output of `self` to be the input of `next`, both
/// steps to be concrete (`Sized`), and the intermediate type to be `Send`.
///
/// `apply` takes `&self`: a step holding random state keeps it behind
/// interior mutability so the pipeline can be shared across loader threads.
pub trait Transform<I, O>: Send + Sync {
    /// Applies the transformation to the input
    fn apply(&self, input: I) -> Result<O>;

    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain {
            first: self,
            second: next,
            _marker: PhantomData,
        }
    }
}

/// Borrowed steps are steps too, so one layer can appear in several pipelines.
impl<I, O, T> Transform<I, O> for &T
where
    T: Transform<I, O> + ?Sized,
{
    fn apply(&self, input: I) -> Result<O> {
        (**self).apply(input)
    }
}

/// A chain of two transforms (`A` -> `B`) joined on intermediate type `M`.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    /// Creates a new transform chain; equivalent to `first.then(second)`.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I) -> Result<O> {
        self.first
            .apply(input)
            .and_then(|mid| self.second.apply(mid))
            .with_context(|| {
                format!(
                    "Transform chain failed: {} → {} → {}",
                    std::any::type_name::<A>(),
                    std::any::type_name::<B>(),
                    std::any::type_name::<O>()
                )
            })
    }
}
