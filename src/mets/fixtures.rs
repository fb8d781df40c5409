//! METS documents shared by tests across the crate

/// A small DFG-Viewer style document with three pages
pub const SAMPLE_METS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:mods="http://www.loc.gov/mods/v3" xmlns:xlink="http://www.w3.org/1999/xlink" xmlns:dv="http://dfg-viewer.de/">
  <mets:dmdSec ID="DMD_1">
    <mets:mdWrap MDTYPE="MODS">
      <mets:xmlData>
        <mods:mods>
          <mods:identifier type="urn">urn:nbn:de:test-1</mods:identifier>
          <mods:identifier type="purl">http://purl.example.org/1</mods:identifier>
          <mods:recordInfo><mods:recordIdentifier source="test-db">rec-1</mods:recordIdentifier></mods:recordInfo>
          <mods:titleInfo><mods:nonSort>Die </mods:nonSort><mods:title>Beispielschrift</mods:title><mods:subTitle>Ein Test</mods:subTitle></mods:titleInfo>
          <mods:name type="personal">
            <mods:displayForm>Dilherr, Johann Michael</mods:displayForm>
            <mods:role><mods:roleTerm type="code" authority="marcrelator">aut</mods:roleTerm></mods:role>
          </mods:name>
          <mods:name type="personal">
            <mods:namePart type="family">Endter</mods:namePart>
            <mods:namePart type="given">Wolfgang</mods:namePart>
            <mods:role><mods:roleTerm type="code">prt</mods:roleTerm></mods:role>
          </mods:name>
          <mods:originInfo>
            <mods:place><mods:placeTerm type="text">Nürnberg</mods:placeTerm></mods:place>
            <mods:publisher>Endter</mods:publisher>
            <mods:dateIssued>1663</mods:dateIssued>
          </mods:originInfo>
          <mods:language>
            <mods:languageTerm type="code">ger</mods:languageTerm>
            <mods:languageTerm type="text">German</mods:languageTerm>
          </mods:language>
          <mods:genre>Predigt</mods:genre>
          <mods:abstract>A sample.</mods:abstract>
        </mods:mods>
      </mets:xmlData>
    </mets:mdWrap>
  </mets:dmdSec>
  <mets:amdSec ID="AMD">
    <mets:rightsMD ID="RIGHTS">
      <mets:mdWrap MDTYPE="OTHER" OTHERMDTYPE="DVRIGHTS">
        <mets:xmlData>
          <dv:rights>
            <dv:owner>Test Library</dv:owner>
            <dv:ownerLogo>http://example.org/logo.png</dv:ownerLogo>
            <dv:ownerSiteURL>http://example.org</dv:ownerSiteURL>
            <dv:license>cc-by</dv:license>
          </dv:rights>
        </mets:xmlData>
      </mets:mdWrap>
    </mets:rightsMD>
    <mets:digiprovMD ID="DIGIPROV">
      <mets:mdWrap MDTYPE="OTHER" OTHERMDTYPE="DVLINKS">
        <mets:xmlData>
          <dv:links><dv:presentation>http://example.org/view/1</dv:presentation></dv:links>
        </mets:xmlData>
      </mets:mdWrap>
    </mets:digiprovMD>
  </mets:amdSec>
  <mets:fileSec>
    <mets:fileGrp USE="DEFAULT">
      <mets:file ID="IMG_DEFAULT_1" MIMETYPE="image/jpeg"><mets:FLocat LOCTYPE="URL" xlink:href="http://example.org/default/1.jpg"/></mets:file>
      <mets:file ID="IMG_DEFAULT_2" MIMETYPE="image/jpg"><mets:FLocat LOCTYPE="URL" xlink:href="http://example.org/default/2.jpg"/></mets:file>
      <mets:file ID="IMG_DEFAULT_3" MIMETYPE="image/jpeg"><mets:FLocat LOCTYPE="URL" xlink:href="http://example.org/default/3.jpg"/></mets:file>
    </mets:fileGrp>
    <mets:fileGrp USE="THUMBS">
      <mets:file ID="IMG_THUMB_1" MIMETYPE="image/jpeg"><mets:FLocat LOCTYPE="URL" xlink:href="http://example.org/thumbs/1.jpg"/></mets:file>
      <mets:file ID="IMG_THUMB_2" MIMETYPE="image/jpeg"><mets:FLocat LOCTYPE="URL" xlink:href="http://example.org/thumbs/2.jpg"/></mets:file>
      <mets:file ID="IMG_THUMB_3" MIMETYPE="image/jpeg"><mets:FLocat LOCTYPE="URL" xlink:href="http://example.org/thumbs/3.jpg"/></mets:file>
    </mets:fileGrp>
    <mets:fileGrp USE="LOCAL">
      <mets:file ID="IMG_LOCAL_1" MIMETYPE="image/jpeg"><mets:FLocat LOCTYPE="OTHER" xlink:href="file:///data/1.jpg"/></mets:file>
    </mets:fileGrp>
    <mets:fileGrp USE="DOWNLOAD">
      <mets:file ID="PDF_1" MIMETYPE="application/pdf"><mets:FLocat LOCTYPE="URL" xlink:href="http://example.org/download/full.pdf"/></mets:file>
    </mets:fileGrp>
  </mets:fileSec>
  <mets:structMap TYPE="LOGICAL">
    <mets:div ID="LOG_0" TYPE="monograph" LABEL="Beispielschrift" DMDID="DMD_1">
      <mets:div ID="LOG_1" TYPE="title_page" LABEL="Titelblatt"/>
      <mets:div ID="LOG_2" TYPE="section">
        <mets:div ID="LOG_3" TYPE="chapter" LABEL="Kapitel 1"/>
      </mets:div>
      <mets:div ID="LOG_4" TYPE="chapter" LABEL="Kapitel 2"/>
    </mets:div>
  </mets:structMap>
  <mets:structMap TYPE="PHYSICAL">
    <mets:div ID="PHYS_0000" TYPE="physSequence">
      <mets:div ID="PHYS_0003" TYPE="page" ORDER="3">
        <mets:fptr FILEID="IMG_DEFAULT_3"/>
        <mets:fptr FILEID="IMG_THUMB_3"/>
      </mets:div>
      <mets:div ID="PHYS_0001" TYPE="page" ORDER="1" ORDERLABEL="[I]" LABEL="Titel">
        <mets:fptr FILEID="IMG_DEFAULT_1"/>
        <mets:fptr FILEID="IMG_THUMB_1"/>
        <mets:fptr FILEID="IMG_LOCAL_1"/>
      </mets:div>
      <mets:div ID="PHYS_0002" TYPE="page" ORDER="2" ORDERLABEL="[II]">
        <mets:fptr FILEID="IMG_DEFAULT_2"/>
        <mets:fptr FILEID="IMG_THUMB_2"/>
        <mets:fptr FILEID="MISSING"/>
      </mets:div>
    </mets:div>
  </mets:structMap>
  <mets:structLink>
    <mets:smLink xlink:from="LOG_0" xlink:to="PHYS_0001"/>
    <mets:smLink xlink:from="LOG_1" xlink:to="PHYS_0001"/>
    <mets:smLink xlink:from="LOG_3" xlink:to="PHYS_0002"/>
    <mets:smLink xlink:from="LOG_4" xlink:to="PHYS_0003"/>
    <mets:smLink xlink:from="LOG_4" xlink:to="PHYS_9999"/>
  </mets:structLink>
</mets:mets>
"#;

/// Generate a document with `pages` pages, each with `files_per_page`
/// JPEG variants, and one labeled chapter per page
pub fn generate_mets(pages: usize, files_per_page: usize) -> String {
    let mut file_groups = String::new();
    for group in 0..files_per_page {
        file_groups.push_str(&format!(r#"<mets:fileGrp USE="GRP{}">"#, group));
        for page in 1..=pages {
            file_groups.push_str(&format!(
                r#"<mets:file ID="FILE_{g}_{p}" MIMETYPE="image/jpeg"><mets:FLocat LOCTYPE="URL" xlink:href="http://images.example.org/{g}/{p}.jpg"/></mets:file>"#,
                g = group,
                p = page
            ));
        }
        file_groups.push_str("</mets:fileGrp>");
    }

    let mut physical = String::new();
    let mut logical = String::new();
    let mut links = String::new();
    for page in 1..=pages {
        physical.push_str(&format!(r#"<mets:div ID="PHYS_{p}" TYPE="page" ORDER="{p}">"#, p = page));
        for group in 0..files_per_page {
            physical.push_str(&format!(r#"<mets:fptr FILEID="FILE_{}_{}"/>"#, group, page));
        }
        physical.push_str("</mets:div>");
        logical.push_str(&format!(
            r#"<mets:div ID="LOG_{p}" TYPE="chapter" LABEL="Chapter {p}"/>"#,
            p = page
        ));
        links.push_str(&format!(
            r#"<mets:smLink xlink:from="LOG_{p}" xlink:to="PHYS_{p}"/>"#,
            p = page
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:mods="http://www.loc.gov/mods/v3" xmlns:xlink="http://www.w3.org/1999/xlink">
  <mets:dmdSec ID="DMD_1"><mets:mdWrap MDTYPE="MODS"><mets:xmlData>
    <mods:mods>
      <mods:recordInfo><mods:recordIdentifier source="gen">generated-{pages}</mods:recordIdentifier></mods:recordInfo>
      <mods:titleInfo><mods:title>Generated volume</mods:title></mods:titleInfo>
    </mods:mods>
  </mets:xmlData></mets:mdWrap></mets:dmdSec>
  <mets:fileSec>{file_groups}</mets:fileSec>
  <mets:structMap TYPE="LOGICAL"><mets:div ID="LOG_0" TYPE="monograph" LABEL="Generated volume">{logical}</mets:div></mets:structMap>
  <mets:structMap TYPE="PHYSICAL"><mets:div ID="PHYS_0" TYPE="physSequence">{physical}</mets:div></mets:structMap>
  <mets:structLink>{links}</mets:structLink>
</mets:mets>
"#,
        pages = pages,
        file_groups = file_groups,
        logical = logical,
        physical = physical,
        links = links
    )
}
