use rand::Rng;

use crate::sample::uniform01;

/// Switch to sequential skip generation when `n^2 / N` exceeds this.
pub const N2N_THRESHOLD: f64 = 50.0;

/// Density cutoff above which a single draw falls back to the sequential
/// method (Vitter's alpha parameter).
pub const ALPHA: f64 = 0.8;

/// Uniform draw in `(0, 1]`, safe to feed to `ln`/`powf`.
#[inline]
fn uniform_pos<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    1.0 - uniform01(rng)
}

/// `u^(1/k)` for u ~ Uniform(0,1]: one step of the running skip variable.
#[inline]
fn vprime_draw<R: Rng + ?Sized>(rng: &mut R, k: f64) -> f64 {
    uniform_pos(rng).powf(1.0 / k)
}

/// Fill `samples` with `samples.len()` distinct, strictly increasing indices
/// drawn uniformly without replacement from `[0, big_n)`.
///
/// This is Vitter's Algorithm D (Vitter 1984, CACM 27:703-718): a running
/// skip `S` is drawn per output index in O(1) expected time, so the whole
/// draw is O(n) without materializing the population. Skips come from the
/// rejection method below except when the sample is dense (`n^2/N` over the
/// threshold, or a single draw with `n/N > ALPHA`), where sequential CDF
/// inversion is cheaper.
pub fn vitter_d<R: Rng + ?Sized>(samples: &mut [usize], big_n: usize, rng: &mut R) {
    let mut n = samples.len();
    if n == 0 {
        return;
    }
    debug_assert!(n <= big_n, "cannot sample {n} from {big_n}");
    let mut remaining = big_n;
    let mut current: isize = -1;
    let sequential = (n * n) as f64 / big_n as f64 > N2N_THRESHOLD;

    for slot in samples.iter_mut() {
        let s = if n == 1 {
            (uniform01(rng) * remaining as f64) as usize
        } else if sequential || n as f64 > ALPHA * remaining as f64 {
            skip_sequential(n, remaining, rng)
        } else {
            skip_rejection(n, remaining, rng)
        };
        current += s as isize + 1;
        *slot = current as usize;
        remaining -= s + 1;
        n -= 1;
    }
}

/// Exact skip by sequential CDF inversion (Vitter's method A step).
fn skip_sequential<R: Rng + ?Sized>(n: usize, big_n: usize, rng: &mut R) -> usize {
    let v = uniform01(rng);
    let mut s = 0usize;
    let mut top = (big_n - n) as f64;
    let mut rest = big_n as f64;
    let mut quot = top / rest;
    while quot > v {
        s += 1;
        top -= 1.0;
        rest -= 1.0;
        quot *= top / rest;
    }
    s
}

/// One skip via Vitter's rejection method (method D), exact for `n >= 2`.
fn skip_rejection<R: Rng + ?Sized>(n: usize, big_n: usize, rng: &mut R) -> usize {
    let nreal = n as f64;
    let nmin1 = nreal - 1.0;
    let big_nreal = big_n as f64;
    let qu1 = big_n - n + 1;
    let qu1real = qu1 as f64;
    let mut vprime = vprime_draw(rng, nreal);

    loop {
        // Draw X from the dominating distribution until S lands in range.
        let mut x;
        let mut s;
        loop {
            x = big_nreal * (1.0 - vprime);
            s = x as usize;
            if s < qu1 {
                break;
            }
            vprime = vprime_draw(rng, nreal);
        }
        let sreal = s as f64;
        let u = uniform_pos(rng);
        let y1 = (u * big_nreal / qu1real).powf(1.0 / nmin1);
        vprime = y1 * (1.0 - x / big_nreal) * (qu1real / (qu1real - sreal));
        if vprime <= 1.0 {
            // Quick acceptance.
            return s;
        }

        // Full acceptance test.
        let mut y2 = 1.0;
        let mut top = big_nreal - 1.0;
        let mut bottom;
        let limit;
        if n - 1 > s {
            bottom = big_nreal - nreal;
            limit = big_n - s;
        } else {
            bottom = big_nreal - sreal - 1.0;
            limit = qu1;
        }
        let mut t = big_n - 1;
        while t >= limit {
            y2 *= top / bottom;
            top -= 1.0;
            bottom -= 1.0;
            t -= 1;
        }
        if big_nreal / (big_nreal - x) >= y1 * (y2.ln() / nmin1).exp() {
            return s;
        }
        vprime = vprime_draw(rng, nreal);
    }
}
