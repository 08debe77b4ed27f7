/// Creates a single question [`ContentItem`](crate::ContentItem) from a kind
/// shorthand.
///
/// ```rust
/// use parley::{ContentKind, content};
///
/// let item = content!(image_url => "https://example.com/cat.png");
/// assert_eq!(item.kind, ContentKind::ImageUrl);
/// assert_eq!(item.content, "https://example.com/cat.png");
/// ```
#[macro_export]
macro_rules! content {
    (text => $content:expr $(,)?) => {
        $crate::ContentItem::text($content)
    };
    (system => $content:expr $(,)?) => {
        $crate::ContentItem::system($content)
    };
    (image_url => $content:expr $(,)?) => {
        $crate::ContentItem::image_url($content)
    };
    (file_url => $content:expr $(,)?) => {
        $crate::ContentItem::file_url($content)
    };
    (virtual_contexts => $content:expr $(,)?) => {
        $crate::ContentItem::virtual_contexts($content)
    };
    ($kind:ident => $content:expr $(,)?) => {
        compile_error!(
            "unsupported content kind: use text, system, image_url, file_url, or virtual_contexts"
        );
    };
}

/// Creates a `Vec<ContentItem>` from kind/content pairs.
///
/// ```rust
/// use parley::{ContentKind, contents};
///
/// let items = contents![
///     system => "Answer in one sentence.",
///     text => "What's the weather in Paris?",
/// ];
///
/// assert_eq!(items.len(), 2);
/// assert_eq!(items[0].kind, ContentKind::System);
/// assert_eq!(items[1].kind, ContentKind::Text);
/// ```
#[macro_export]
macro_rules! contents {
    () => {
        Vec::<$crate::ContentItem>::new()
    };
    ($($kind:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::content!($kind => $content)),+]
    };
}

/// Creates a text [`ChatRequest`](crate::ChatRequest), optionally under a
/// context prefix other than the default `"chat"`.
///
/// ```rust
/// use parley::chat_request;
///
/// let request = chat_request!("user-1", "feishu", "gpt-4o-mini", "Hello");
/// assert_eq!(request.key.prefix(), "feishu");
/// assert_eq!(request.chat_model, "gpt-4o-mini");
/// assert_eq!(request.first_text(), "Hello");
/// ```
#[macro_export]
macro_rules! chat_request {
    ($user_id:expr, $model:expr, $text:expr $(,)?) => {
        $crate::ask(
            $crate::conversation($user_id, $crate::util::DEFAULT_PREFIX),
            $model,
            $text,
        )
    };
    ($user_id:expr, $prefix:expr, $model:expr, $text:expr $(,)?) => {
        $crate::ask($crate::conversation($user_id, $prefix), $model, $text)
    };
}
