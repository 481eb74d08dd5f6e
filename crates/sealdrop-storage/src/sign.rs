//! Scoped credential signer: SigV4 request signing against the object store.
//!
//! Produces presigned URLs bound to one HTTP method and one object path,
//! valid for a short fixed window, plus header signatures for the batch
//! delete call. Method and path are part of the canonical request, so a
//! credential signed for PUT is rejected by the store if replayed as GET.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

use sealdrop_core::{AppError, Config};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// SigV4 URI encoding: everything except unreserved characters.
const URI_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Same, but `/` stays literal inside paths.
const PATH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Signs object-store requests with long-lived credentials held only in
/// server-side configuration.
#[derive(Clone, Debug)]
pub struct ScopedUrlSigner {
    bucket_url: String,
    host: String,
    base_path: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
}

impl ScopedUrlSigner {
    pub fn new(
        bucket_url: &str,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Result<Self, AppError> {
        let bucket_url = bucket_url.trim_end_matches('/').to_string();
        let rest = bucket_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .ok_or_else(|| {
                AppError::Signing(format!("bucket URL has no scheme: {}", bucket_url))
            })?;

        let (host, base_path) = match rest.split_once('/') {
            Some((host, path)) => (host.to_string(), format!("/{}", path)),
            None => (rest.to_string(), String::new()),
        };
        if host.is_empty() {
            return Err(AppError::Signing("bucket URL has no host".to_string()));
        }

        Ok(Self {
            bucket_url,
            host,
            base_path,
            region: region.to_string(),
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            &config.s3_bucket_url,
            &config.aws_region,
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
        )
    }

    pub fn bucket_url(&self) -> &str {
        &self.bucket_url
    }

    /// Scoped PUT credential for one object. The declared size is signed
    /// into `content-length`, so the store enforces it as an upper bound.
    pub fn presign_put(
        &self,
        object_key: &str,
        content_length: i64,
        expires_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        self.presign(
            "PUT",
            object_key,
            &[
                ("content-length", content_length.to_string()),
                ("content-type", "application/octet-stream".to_string()),
            ],
            expires_secs,
            now,
        )
    }

    /// Scoped GET credential for one object.
    pub fn presign_get(
        &self,
        object_key: &str,
        expires_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        self.presign("GET", object_key, &[], expires_secs, now)
    }

    fn presign(
        &self,
        method: &str,
        object_key: &str,
        extra_headers: &[(&str, String)],
        expires_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/aws4_request", datestamp, self.region, SERVICE);
        let credential = format!("{}/{}", self.access_key_id, scope);

        // Canonical headers: host plus any extras, sorted by name.
        let mut headers: Vec<(String, String)> = vec![("host".to_string(), self.host.clone())];
        for (name, value) in extra_headers {
            headers.push((name.to_string(), value.clone()));
        }
        headers.sort();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();

        let mut query: Vec<(String, String)> = vec![
            ("X-Amz-Algorithm".to_string(), ALGORITHM.to_string()),
            ("X-Amz-Credential".to_string(), credential),
            ("X-Amz-Date".to_string(), amz_date.clone()),
            ("X-Amz-Expires".to_string(), expires_secs.to_string()),
            ("X-Amz-SignedHeaders".to_string(), signed_headers.clone()),
        ];
        query.sort();
        let canonical_query = canonical_query_string(&query);

        let canonical_uri = format!(
            "{}/{}",
            utf8_percent_encode(&self.base_path, PATH_ENCODE),
            utf8_percent_encode(object_key, URI_ENCODE),
        );

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, canonical_uri, canonical_query, canonical_headers, signed_headers,
            UNSIGNED_PAYLOAD,
        );

        let signature = self.signature(&canonical_request, &amz_date, &scope, &datestamp)?;

        Ok(format!(
            "{}/{}?{}&X-Amz-Signature={}",
            self.bucket_url,
            utf8_percent_encode(object_key, URI_ENCODE),
            canonical_query,
            signature,
        ))
    }

    /// Header-based signature for a request with a body (the batch delete
    /// POST). Returns the headers to attach, including `Authorization`.
    pub fn sign_headers(
        &self,
        method: &str,
        query: &[(&str, &str)],
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, AppError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/aws4_request", datestamp, self.region, SERVICE);
        let payload_hash = hex::encode(Sha256::digest(payload));

        let headers = [
            ("host".to_string(), self.host.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect();

        let mut query: Vec<(String, String)> = query
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        query.sort();
        let canonical_query = canonical_query_string(&query);

        let canonical_uri = if self.base_path.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", utf8_percent_encode(&self.base_path, PATH_ENCODE))
        };

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, canonical_uri, canonical_query, canonical_headers, signed_headers,
            payload_hash,
        );

        let signature = self.signature(&canonical_request, &amz_date, &scope, &datestamp)?;

        Ok(vec![
            (
                "authorization".to_string(),
                format!(
                    "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                    ALGORITHM, self.access_key_id, scope, signed_headers, signature,
                ),
            ),
            ("x-amz-content-sha256".to_string(), payload_hash),
            ("x-amz-date".to_string(), amz_date),
        ])
    }

    fn signature(
        &self,
        canonical_request: &str,
        amz_date: &str,
        scope: &str,
        datestamp: &str,
    ) -> Result<String, AppError> {
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes())),
        );

        let date_key = hmac_sha256(
            format!("AWS4{}", self.secret_access_key).as_bytes(),
            datestamp.as_bytes(),
        )?;
        let region_key = hmac_sha256(&date_key, self.region.as_bytes())?;
        let service_key = hmac_sha256(&region_key, SERVICE.as_bytes())?;
        let signing_key = hmac_sha256(&service_key, b"aws4_request")?;

        Ok(hex::encode(hmac_sha256(
            &signing_key,
            string_to_sign.as_bytes(),
        )?))
    }
}

fn canonical_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, URI_ENCODE),
                utf8_percent_encode(value, URI_ENCODE),
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Signing(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer() -> ScopedUrlSigner {
        ScopedUrlSigner::new(
            "https://my-bucket.s3.eu-west-1.amazonaws.com",
            "eu-west-1",
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
        )
        .unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 21, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_presign_get_carries_all_query_parameters() {
        let url = signer().presign_get("object-id", 60, fixed_now()).unwrap();

        assert!(url.starts_with("https://my-bucket.s3.eu-west-1.amazonaws.com/object-id?"));
        for param in [
            "X-Amz-Algorithm=AWS4-HMAC-SHA256",
            "X-Amz-Credential=AKIDEXAMPLE%2F20240521%2Feu-west-1%2Fs3%2Faws4_request",
            "X-Amz-Date=20240521T120000Z",
            "X-Amz-Expires=60",
            "X-Amz-SignedHeaders=host",
            "X-Amz-Signature=",
        ] {
            assert!(url.contains(param), "missing {} in {}", param, url);
        }
    }

    #[test]
    fn test_presign_is_deterministic_for_fixed_time() {
        let a = signer().presign_get("k", 60, fixed_now()).unwrap();
        let b = signer().presign_get("k", 60, fixed_now()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_method_is_bound_into_the_signature() {
        let get = signer().presign_get("k", 60, fixed_now()).unwrap();
        let put = signer().presign_put("k", 10, 60, fixed_now()).unwrap();

        let sig = |url: &str| {
            url.split("X-Amz-Signature=")
                .nth(1)
                .map(str::to_string)
                .unwrap()
        };
        assert_ne!(sig(&get), sig(&put));
    }

    #[test]
    fn test_path_is_bound_into_the_signature() {
        let a = signer().presign_get("object-a", 60, fixed_now()).unwrap();
        let b = signer().presign_get("object-b", 60, fixed_now()).unwrap();
        let sig = |url: &str| url.split("X-Amz-Signature=").nth(1).unwrap().to_string();
        assert_ne!(sig(&a), sig(&b));
    }

    #[test]
    fn test_presign_put_signs_content_length_bound() {
        let url = signer().presign_put("k", 1234, 60, fixed_now()).unwrap();
        assert!(url.contains("X-Amz-SignedHeaders=content-length%3Bcontent-type%3Bhost"));

        // A different declared size must invalidate the signature.
        let other = signer().presign_put("k", 1235, 60, fixed_now()).unwrap();
        assert_ne!(url, other);
    }

    #[test]
    fn test_sign_headers_for_batch_delete() {
        let headers = signer()
            .sign_headers("POST", &[("delete", "")], b"<Delete/>", fixed_now())
            .unwrap();

        let auth = &headers
            .iter()
            .find(|(name, _)| name == "authorization")
            .unwrap()
            .1;
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240521/eu-west-1/s3/aws4_request"));
        assert!(auth.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));

        let sha = &headers
            .iter()
            .find(|(name, _)| name == "x-amz-content-sha256")
            .unwrap()
            .1;
        assert_eq!(*sha, hex::encode(Sha256::digest(b"<Delete/>")));
    }

    #[test]
    fn test_rejects_bucket_url_without_scheme() {
        let err = ScopedUrlSigner::new("bucket.example.com", "r", "a", "s").unwrap_err();
        assert!(matches!(err, AppError::Signing(_)));
    }

    #[test]
    fn test_path_style_bucket_url() {
        let signer = ScopedUrlSigner::new(
            "https://s3.eu-west-1.amazonaws.com/my-bucket",
            "eu-west-1",
            "a",
            "s",
        )
        .unwrap();
        let url = signer.presign_get("k", 60, fixed_now()).unwrap();
        assert!(url.starts_with("https://s3.eu-west-1.amazonaws.com/my-bucket/k?"));
    }
}
