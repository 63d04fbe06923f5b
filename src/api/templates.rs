use crate::domains::identicon::RenderedImage;

const IDENTICON_PAGE: &str = r#"
	<!DOCTYPE html>
	<html>
	<head></head>
	<body>
		<img src="data:image/png;base64,{{IMAGE_DATA_BASE64}}">
	</body>
	</html>
"#;

/// HTML page that inlines the image as a base64 data URI.
/// Base64 output never contains HTML metacharacters, so no escaping is needed.
pub fn identicon_page(image: &RenderedImage) -> String {
    IDENTICON_PAGE.replace("{{IMAGE_DATA_BASE64}}", &image.to_base64())
}
