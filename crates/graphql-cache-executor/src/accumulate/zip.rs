//! Composing multiple accumulators into one pass.

use graphql_cache_types::Scalar;

use super::{Accumulator, FieldContext, ObjectContext};

/// Runs two accumulators over the same traversal, fanning every hook out
/// to both and pairing their final results.
pub struct Zip2<A, B>(pub A, pub B);

impl<A, B> Accumulator for Zip2<A, B>
where
    A: Accumulator,
    B: Accumulator,
{
    type Partial = (A::Partial, B::Partial);
    type Final = (A::Final, B::Final);

    fn accept_scalar(&self, value: &Scalar, ctx: &FieldContext<'_>) -> Self::Partial {
        (self.0.accept_scalar(value, ctx), self.1.accept_scalar(value, ctx))
    }

    fn accept_list(&self, items: Vec<Self::Partial>, ctx: &FieldContext<'_>) -> Self::Partial {
        let (a_items, b_items): (Vec<_>, Vec<_>) = items.into_iter().unzip();
        (self.0.accept_list(a_items, ctx), self.1.accept_list(b_items, ctx))
    }

    fn accept_object(
        &self,
        fields: Vec<(FieldContext<'_>, Self::Partial)>,
        object: &ObjectContext,
    ) -> Self::Partial {
        let (a_fields, b_fields): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|(ctx, (a, b))| ((ctx, a), (ctx, b)))
            .unzip();
        (
            self.0.accept_object(a_fields, object),
            self.1.accept_object(b_fields, object),
        )
    }

    fn finish(&self, root: Self::Partial) -> Self::Final {
        (self.0.finish(root.0), self.1.finish(root.1))
    }
}

/// Runs three accumulators over the same traversal. Composed internally
/// from two nested [`Zip2`]s, but exposes a flat 3-tuple so callers never
/// see the nesting.
pub struct Zip3<A, B, C>(Zip2<Zip2<A, B>, C>);

impl<A, B, C> Zip3<A, B, C> {
    pub fn new(a: A, b: B, c: C) -> Self {
        Zip3(Zip2(Zip2(a, b), c))
    }
}

impl<A, B, C> Accumulator for Zip3<A, B, C>
where
    A: Accumulator,
    B: Accumulator,
    C: Accumulator,
{
    type Partial = (A::Partial, B::Partial, C::Partial);
    type Final = (A::Final, B::Final, C::Final);

    fn accept_scalar(&self, value: &Scalar, ctx: &FieldContext<'_>) -> Self::Partial {
        let ((a, b), c) = self.0.accept_scalar(value, ctx);
        (a, b, c)
    }

    fn accept_list(&self, items: Vec<Self::Partial>, ctx: &FieldContext<'_>) -> Self::Partial {
        let nested = items.into_iter().map(|(a, b, c)| ((a, b), c)).collect();
        let ((a, b), c) = self.0.accept_list(nested, ctx);
        (a, b, c)
    }

    fn accept_object(
        &self,
        fields: Vec<(FieldContext<'_>, Self::Partial)>,
        object: &ObjectContext,
    ) -> Self::Partial {
        let nested = fields
            .into_iter()
            .map(|(ctx, (a, b, c))| (ctx, ((a, b), c)))
            .collect();
        let ((a, b), c) = self.0.accept_object(nested, object);
        (a, b, c)
    }

    fn finish(&self, root: Self::Partial) -> Self::Final {
        let (a, b, c) = root;
        let ((fa, fb), fc) = self.0.finish(((a, b), c));
        (fa, fb, fc)
    }
}
